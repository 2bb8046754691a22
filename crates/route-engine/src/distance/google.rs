use async_trait::async_trait;
use serde::Deserialize;

use super::{rows_to_matrix, DistanceProvider};
use crate::model::{CostMatrix, Point};
use route_common::{Result, RouteError};

/// Origins (and destinations) per request; 10 x 10 stays within the 100-element request limit.
const TILE: usize = 10;

/// Road-network distances from the Google Distance Matrix API.
///
/// Larger groups are fetched tile by tile and assembled into one matrix.
pub struct GoogleDistanceMatrixProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    status: String,
    distance: Option<Distance>,
}

#[derive(Debug, Deserialize)]
struct Distance {
    /// Metres
    value: f64,
}

impl GoogleDistanceMatrixProvider {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: String) -> Self {
        Self {
            client,
            endpoint: format!("{}/maps/api/distancematrix/json", base_url.trim_end_matches('/')),
            api_key,
        }
    }

    async fn fetch_tile(&self, origins: &[Point], destinations: &[Point]) -> Result<Vec<Vec<f64>>> {
        let query = [
            ("origins", join_locations(origins)),
            ("destinations", join_locations(destinations)),
            ("key", self.api_key.clone()),
        ];

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| RouteError::provider(format!("google distance matrix request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RouteError::provider(format!("google distance matrix returned {status}")));
        }

        let payload: MatrixResponse = response
            .json()
            .await
            .map_err(|e| RouteError::provider(format!("malformed google distance matrix response: {e}")))?;

        if payload.status != "OK" {
            let detail = payload.error_message.unwrap_or_default();
            tracing::warn!(status = %payload.status, "google distance matrix rejected request");
            return Err(RouteError::provider(format!(
                "google distance matrix status {}: {detail}",
                payload.status
            )));
        }
        if payload.rows.len() != origins.len() {
            return Err(RouteError::provider(format!(
                "google distance matrix returned {} rows for {} origins",
                payload.rows.len(),
                origins.len()
            )));
        }

        payload
            .rows
            .into_iter()
            .map(|row| {
                if row.elements.len() != destinations.len() {
                    return Err(RouteError::provider("google distance matrix row has the wrong length"));
                }
                row.elements
                    .into_iter()
                    .map(|element| match (element.status.as_str(), element.distance) {
                        ("OK", Some(distance)) => Ok(distance.value),
                        (status, _) => Err(RouteError::provider(format!(
                            "google distance matrix element status {status}"
                        ))),
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect()
    }
}

#[async_trait]
impl DistanceProvider for GoogleDistanceMatrixProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn matrix(&self, points: &[Point]) -> Result<CostMatrix> {
        let n = points.len();
        let mut rows = vec![vec![0.0; n]; n];

        for (oi, origins) in points.chunks(TILE).enumerate() {
            for (di, destinations) in points.chunks(TILE).enumerate() {
                let tile = self.fetch_tile(origins, destinations).await?;
                for (r, values) in tile.into_iter().enumerate() {
                    let row = &mut rows[oi * TILE + r];
                    row[di * TILE..di * TILE + values.len()].copy_from_slice(&values);
                }
            }
        }

        rows_to_matrix(self.name(), n, rows)
    }
}

fn join_locations(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.lat, p.lng))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn provider(server: &mockito::Server) -> GoogleDistanceMatrixProvider {
        GoogleDistanceMatrixProvider::new(reqwest::Client::new(), &server.url(), "test-key".into())
    }

    #[tokio::test]
    async fn parses_elements_into_matrix() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/maps/api/distancematrix/json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("origins".into(), "47.5,19|47.6,19.1".into()),
                Matcher::UrlEncoded("destinations".into(), "47.5,19|47.6,19.1".into()),
                Matcher::UrlEncoded("key".into(), "test-key".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{
                    "status": "OK",
                    "rows": [
                        {"elements": [
                            {"status": "OK", "distance": {"text": "0 km", "value": 0}},
                            {"status": "OK", "distance": {"text": "15 km", "value": 15234}}
                        ]},
                        {"elements": [
                            {"status": "OK", "distance": {"text": "15 km", "value": 15120}},
                            {"status": "OK", "distance": {"text": "0 km", "value": 0}}
                        ]}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let points = vec![Point::new(0, 47.5, 19.0), Point::new(1, 47.6, 19.1)];
        let matrix = provider(&server).matrix(&points).await.unwrap();
        mock.assert_async().await;
        assert_eq!(matrix.get(0, 1), 15234.0);
        assert_eq!(matrix.get(1, 0), 15120.0);
    }

    #[tokio::test]
    async fn request_denied_is_a_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/maps/api/distancematrix/json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid.", "rows": []}"#)
            .create_async()
            .await;

        let points = vec![Point::new(0, 47.5, 19.0), Point::new(1, 47.6, 19.1)];
        let err = provider(&server).matrix(&points).await.unwrap_err();
        assert!(matches!(err, RouteError::Provider(_)));
        assert!(err.to_string().contains("REQUEST_DENIED"));
    }

    #[tokio::test]
    async fn zero_results_element_is_a_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/maps/api/distancematrix/json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"status": "OK", "rows": [
                    {"elements": [{"status": "OK", "distance": {"value": 0}}, {"status": "ZERO_RESULTS"}]},
                    {"elements": [{"status": "ZERO_RESULTS"}, {"status": "OK", "distance": {"value": 0}}]}
                ]}"#,
            )
            .create_async()
            .await;

        let points = vec![Point::new(0, 47.5, 19.0), Point::new(1, -33.9, 18.4)];
        let err = provider(&server).matrix(&points).await.unwrap_err();
        assert!(err.to_string().contains("ZERO_RESULTS"));
    }

    #[tokio::test]
    async fn large_groups_are_fetched_in_tiles() {
        let mut server = mockito::Server::new_async().await;
        // 12 points -> origins/destinations split into 10 + 2, four requests.
        let full_row = |n: usize| {
            let elements: Vec<String> = (0..n)
                .map(|_| r#"{"status": "OK", "distance": {"value": 5}}"#.to_string())
                .collect();
            format!(r#"{{"elements": [{}]}}"#, elements.join(","))
        };
        let body = |origins: usize, destinations: usize| {
            let rows: Vec<String> = (0..origins).map(|_| full_row(destinations)).collect();
            format!(r#"{{"status": "OK", "rows": [{}]}}"#, rows.join(","))
        };

        let points: Vec<Point> = (0..12).map(|i| Point::new(i, 47.0 + i as f64 * 0.1, 19.0)).collect();
        let big = join_locations(&points[..10]);
        let small = join_locations(&points[10..]);
        for (origins, destinations, o, d) in [
            (&big, &big, 10, 10),
            (&big, &small, 10, 2),
            (&small, &big, 2, 10),
            (&small, &small, 2, 2),
        ] {
            server
                .mock("GET", "/maps/api/distancematrix/json")
                .match_query(Matcher::AllOf(vec![
                    Matcher::UrlEncoded("origins".into(), origins.clone()),
                    Matcher::UrlEncoded("destinations".into(), destinations.clone()),
                ]))
                .with_status(200)
                .with_body(body(o, d))
                .expect(1)
                .create_async()
                .await;
        }

        let matrix = provider(&server).matrix(&points).await.unwrap();
        assert_eq!(matrix.size(), 12);
        assert_eq!(matrix.get(11, 0), 5.0);
        assert_eq!(matrix.get(3, 11), 5.0);
    }
}
