use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;

use super::{rows_to_matrix, DistanceProvider};
use crate::model::{CostMatrix, Point};
use route_common::{Result, RouteError};

/// Road-network distances from the OpenRouteService matrix API (`/v2/matrix/{profile}`).
pub struct OpenRouteServiceProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    /// Metres; `null` marks a pair the router could not connect
    distances: Option<Vec<Vec<Option<f64>>>>,
}

impl OpenRouteServiceProvider {
    pub fn new(client: reqwest::Client, base_url: &str, profile: &str, api_key: String) -> Self {
        Self {
            client,
            endpoint: format!("{}/v2/matrix/{}", base_url.trim_end_matches('/'), profile),
            api_key,
        }
    }
}

#[async_trait]
impl DistanceProvider for OpenRouteServiceProvider {
    fn name(&self) -> &'static str {
        "openrouteservice"
    }

    async fn matrix(&self, points: &[Point]) -> Result<CostMatrix> {
        // ORS expects [lng, lat] pairs
        let locations: Vec<[f64; 2]> = points.iter().map(|p| [p.lng, p.lat]).collect();
        let body = json!({ "locations": locations, "metrics": ["distance"] });

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RouteError::provider(format!("openrouteservice request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "openrouteservice rejected matrix request");
            return Err(RouteError::provider(format!("openrouteservice returned {status}: {text}")));
        }

        let payload: MatrixResponse = response
            .json()
            .await
            .map_err(|e| RouteError::provider(format!("malformed openrouteservice response: {e}")))?;

        let rows = payload
            .distances
            .ok_or_else(|| RouteError::provider("openrouteservice response has no distances"))?
            .into_iter()
            .enumerate()
            .map(|(from, row)| {
                row.into_iter()
                    .enumerate()
                    .map(|(to, cell)| {
                        cell.ok_or_else(|| {
                            RouteError::provider(format!("openrouteservice found no route from {from} to {to}"))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        rows_to_matrix(self.name(), points.len(), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn points() -> Vec<Point> {
        vec![Point::new(0, 47.5, 19.0), Point::new(1, 47.6, 19.1)]
    }

    fn provider(server: &mockito::Server) -> OpenRouteServiceProvider {
        OpenRouteServiceProvider::new(reqwest::Client::new(), &server.url(), "driving-car", "test-key".into())
    }

    #[tokio::test]
    async fn parses_distance_matrix() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/matrix/driving-car")
            .match_header("authorization", "test-key")
            .match_body(Matcher::PartialJson(json!({"locations": [[19.0, 47.5], [19.1, 47.6]]})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"distances": [[0.0, 15234.5], [15120.1, 0.0]]}"#)
            .create_async()
            .await;

        let matrix = provider(&server).matrix(&points()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(matrix.size(), 2);
        assert_eq!(matrix.get(0, 1), 15234.5);
        assert_eq!(matrix.get(1, 0), 15120.1);
    }

    #[tokio::test]
    async fn rate_limiting_is_a_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/matrix/driving-car")
            .with_status(429)
            .with_body("Rate limit exceeded")
            .create_async()
            .await;

        let err = provider(&server).matrix(&points()).await.unwrap_err();
        assert!(matches!(err, RouteError::Provider(_)));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn unreachable_pair_is_a_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/matrix/driving-car")
            .with_status(200)
            .with_body(r#"{"distances": [[0.0, null], [10.0, 0.0]]}"#)
            .create_async()
            .await;

        let err = provider(&server).matrix(&points()).await.unwrap_err();
        assert!(matches!(err, RouteError::Provider(_)));
    }

    #[tokio::test]
    async fn malformed_payload_is_a_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/matrix/driving-car")
            .with_status(200)
            .with_body(r#"{"error": "nope"}"#)
            .create_async()
            .await;

        let err = provider(&server).matrix(&points()).await.unwrap_err();
        assert!(matches!(err, RouteError::Provider(_)));
    }
}
