use async_trait::async_trait;
use geo::prelude::*;
use geo::Point as GeoPoint;

use super::DistanceProvider;
use crate::model::{CostMatrix, Point};
use route_common::Result;

/// Great-circle distances, in whole metres.
///
/// Computed locally, so it never fails for valid input. The matrix is symmetric with a zero diagonal.
#[derive(Debug, Default, Clone, Copy)]
pub struct HaversineProvider;

impl HaversineProvider {
    pub fn distance_metres(a: &Point, b: &Point) -> f64 {
        let p1 = GeoPoint::new(a.lng, a.lat);
        let p2 = GeoPoint::new(b.lng, b.lat);
        // Truncated toward zero so costs are integral.
        p1.haversine_distance(&p2).trunc()
    }

    pub fn compute(points: &[Point]) -> Result<CostMatrix> {
        let n = points.len();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = Self::distance_metres(&points[i], &points[j]);
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }
        CostMatrix::from_flat(n, data)
    }
}

#[async_trait]
impl DistanceProvider for HaversineProvider {
    fn name(&self) -> &'static str {
        "haversine"
    }

    async fn matrix(&self, points: &[Point]) -> Result<CostMatrix> {
        Self::compute(points)
    }
}
