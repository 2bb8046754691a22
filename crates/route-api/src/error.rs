use std::any::Any;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::RouteError;
use serde_json::json;

/// Request-boundary error: every failure leaves as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub RouteError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("❌ Request failed: {}", self.0);
        } else {
            tracing::warn!("Rejected request: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<RouteError> for ApiError {
    fn from(err: RouteError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(RouteError::validation(format!("Invalid request body: {}", rejection.body_text())))
    }
}

/// Turns a panic anywhere in request handling into the generic 500 body.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!("💥 Request handler panicked: {}", detail);
    ApiError(RouteError::internal("unexpected failure while handling the request")).into_response()
}
