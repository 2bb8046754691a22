//! Request-scoped routing data: points, groups and cost matrices.

use route_common::{Result, RouteError};

/// A local visiting order into one [`Group`].
pub type GroupRoute = Vec<usize>;

/// The stitched visiting order, expressed in original (sanitized) indices.
pub type FinalRoute = Vec<usize>;

/// A sanitized coordinate together with its position in the sanitized input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Zero-based position in the sanitized input sequence
    pub index: usize,
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(index: usize, lat: f64, lng: f64) -> Self {
        Self { index, lat, lng }
    }

    /// Whether `(lat, lng)` is a finite coordinate inside the WGS84 ranges.
    pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
        lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng)
    }
}

/// Points that are routed together as one sub-problem.
///
/// Local index `i` refers to `points()[i]`; the original index lives on the point itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    points: Vec<Point>,
}

impl Group {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maps a local index back to the original index.
    pub fn original_index(&self, local: usize) -> Option<usize> {
        self.points.get(local).map(|p| p.index)
    }

    pub fn original_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.points.iter().map(|p| p.index)
    }

    /// Arithmetic mean of the member coordinates as `(lat, lng)`.
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.points.len().max(1) as f64;
        let (lat, lng) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
        (lat / n, lng / n)
    }
}

/// Square travel-cost table, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    data: Vec<f64>,
    size: usize,
}

impl CostMatrix {
    /// Builds a matrix from a flat row-major buffer.
    ///
    /// Fails when the buffer is not `size * size` long or holds a negative or non-finite cost.
    pub fn from_flat(size: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != size * size {
            return Err(RouteError::internal(format!(
                "cost matrix of size {size} needs {} entries, got {}",
                size * size,
                data.len()
            )));
        }
        if let Some(bad) = data.iter().find(|c| !c.is_finite() || **c < 0.0) {
            return Err(RouteError::internal(format!("cost matrix holds invalid cost {bad}")));
        }
        Ok(Self { data, size })
    }

    /// Builds a matrix from nested rows; every row must be as long as there are rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let size = rows.len();
        if let Some((row, len)) = rows.iter().map(Vec::len).enumerate().find(|(_, len)| *len != size) {
            return Err(RouteError::internal(format!(
                "cost matrix row {row} has {len} entries, expected {size}"
            )));
        }
        Self::from_flat(size, rows.into_iter().flatten().collect())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Cost of travelling from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
