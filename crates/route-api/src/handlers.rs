use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    /// Raw records; each one is expected to carry `lat` and `lng`
    pub locations: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub route: Vec<usize>,
}

#[derive(Serialize)]
pub struct HealthStatus {
    status: String,
    provider: String,
    solver: String,
    strategy: String,
}

pub async fn optimize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    let Json(request) = payload?;
    tracing::info!("📍 Optimize requested for {} locations", request.locations.len());

    let route = state.composer.optimize(&request.locations).await?;
    Ok(Json(OptimizeResponse { route }))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let composer = &state.composer;
    Json(HealthStatus {
        status: "OK".to_string(),
        provider: composer.provider_name().to_string(),
        solver: composer.solver_name().to_string(),
        strategy: composer.settings().partitioner.name().to_string(),
    })
}
