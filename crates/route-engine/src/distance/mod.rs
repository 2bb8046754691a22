//! Distance sources: anything that can price travel between a group's points.

mod google;
mod haversine;
mod openrouteservice;

pub use google::GoogleDistanceMatrixProvider;
pub use haversine::HaversineProvider;
pub use openrouteservice::OpenRouteServiceProvider;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::model::{CostMatrix, Point};
use route_common::{Config, ProviderKind, Result, RouteError};

/// Produces the cost matrix for one group of points.
///
/// The returned matrix must be square with one row per input point, in input order.
/// Unavailability, rejection or a malformed answer is reported as [`RouteError::Provider`].
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn matrix(&self, points: &[Point]) -> Result<CostMatrix>;
}

/// Builds the provider selected by `DISTANCE_PROVIDER`.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn DistanceProvider>> {
    let provider: Arc<dyn DistanceProvider> = match config.distance_provider {
        ProviderKind::Haversine => Arc::new(HaversineProvider),
        ProviderKind::OpenRouteService => {
            let key = required_key(&config.ors_api_key, "ORS_API_KEY")?;
            Arc::new(OpenRouteServiceProvider::new(
                http_client(config.provider_timeout_secs)?,
                &config.ors_base_url,
                &config.ors_profile,
                key,
            ))
        }
        ProviderKind::Google => {
            let key = required_key(&config.google_maps_api_key, "GOOGLE_MAPS_API_KEY")?;
            Arc::new(GoogleDistanceMatrixProvider::new(
                http_client(config.provider_timeout_secs)?,
                &config.google_base_url,
                key,
            ))
        }
    };
    tracing::info!("📏 Distance provider: {}", provider.name());
    Ok(provider)
}

fn required_key(key: &Option<String>, name: &str) -> Result<String> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RouteError::config(format!("{name} is not set")))
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RouteError::config(format!("failed to build HTTP client: {e}")))
}

/// Converts provider rows into a matrix, treating any shape problem as a provider fault.
pub(crate) fn rows_to_matrix(provider: &str, expected: usize, rows: Vec<Vec<f64>>) -> Result<CostMatrix> {
    if rows.len() != expected {
        return Err(RouteError::provider(format!(
            "{provider} returned {} rows for {expected} locations",
            rows.len()
        )));
    }
    CostMatrix::from_rows(rows).map_err(|e| RouteError::provider(format!("{provider}: {e}")))
}
