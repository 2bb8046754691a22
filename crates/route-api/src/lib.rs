//! HTTP surface of the route optimizer.
//!
//! Exposes `POST /optimize` and `GET /health`; the binary in `main.rs` only loads
//! configuration and serves [`create_router`].

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use route_engine::RouteComposer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Shared, read-only state handed to every handler.
pub struct AppState {
    pub composer: RouteComposer,
}

impl AppState {
    pub fn new(composer: RouteComposer) -> Self {
        Self { composer }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/optimize", post(handlers::optimize))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(error::handle_panic))
}
