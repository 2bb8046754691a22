//! Splitting sanitized points into independently solved groups.

use std::collections::HashSet;

use linfa::prelude::*;
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::model::{Group, Point};
use route_common::{Config, PartitionStrategy, Result, RouteError};

const KMEANS_MAX_ITERATIONS: u64 = 300;
const KMEANS_TOLERANCE: f64 = 1e-6;

/// Strategy for turning one point set into groups.
///
/// Every strategy returns disjoint, non-empty groups whose union is the input.
#[derive(Debug, Clone, PartialEq)]
pub enum Partitioner {
    /// A single group holding every point.
    Single,
    /// Consecutive groups of at most `cluster_size` points, in input order.
    Chunk { cluster_size: usize },
    /// `k` spatial clusters over raw `(lat, lng)` values.
    KMeans {
        k: usize,
        seed: u64,
        /// Sort groups by ascending centroid latitude instead of cluster label.
        order_by_centroid: bool,
    },
}

impl Partitioner {
    pub fn from_config(config: &Config) -> Self {
        match config.partition_strategy {
            PartitionStrategy::None => Partitioner::Single,
            PartitionStrategy::Chunk => Partitioner::Chunk { cluster_size: config.cluster_size },
            PartitionStrategy::Kmeans => Partitioner::KMeans {
                k: config.kmeans_k,
                seed: config.kmeans_seed,
                order_by_centroid: config.order_by_centroid,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Partitioner::Single => "none",
            Partitioner::Chunk { .. } => "chunk",
            Partitioner::KMeans { .. } => "kmeans",
        }
    }

    pub fn partition(&self, points: &[Point]) -> Result<Vec<Group>> {
        if points.is_empty() {
            return Ok(Vec::new());
        }
        let groups = match *self {
            Partitioner::Single => vec![Group::new(points.to_vec())],
            Partitioner::Chunk { cluster_size } => chunk(points, cluster_size)?,
            Partitioner::KMeans { k, seed, order_by_centroid } => {
                kmeans(points, k, seed, order_by_centroid)?
            }
        };
        tracing::debug!(
            strategy = self.name(),
            points = points.len(),
            groups = groups.len(),
            "partitioned points"
        );
        Ok(groups)
    }
}

fn chunk(points: &[Point], cluster_size: usize) -> Result<Vec<Group>> {
    if cluster_size == 0 {
        return Err(RouteError::config("cluster_size must be at least 1"));
    }
    Ok(points.chunks(cluster_size).map(|c| Group::new(c.to_vec())).collect())
}

fn kmeans(points: &[Point], k: usize, seed: u64, order_by_centroid: bool) -> Result<Vec<Group>> {
    if k == 0 {
        return Err(RouteError::config("k must be at least 1"));
    }
    // Below the threshold there is nothing to gain from clustering.
    if points.len() < k {
        return Ok(vec![Group::new(points.to_vec())]);
    }
    // k-means++ seeding cannot pick more centers than there are distinct locations.
    let k = k.min(distinct_locations(points));
    if k <= 1 {
        return Ok(vec![Group::new(points.to_vec())]);
    }

    let observations = Array2::from_shape_vec(
        (points.len(), 2),
        points.iter().flat_map(|p| [p.lat, p.lng]).collect(),
    )
    .map_err(|e| RouteError::internal(format!("failed to build clustering input: {e}")))?;
    let dataset = DatasetBase::from(observations);

    let model = KMeans::params_with_rng(k, StdRng::seed_from_u64(seed))
        .max_n_iterations(KMEANS_MAX_ITERATIONS)
        .tolerance(KMEANS_TOLERANCE)
        .fit(&dataset)
        .map_err(|e| RouteError::internal(format!("k-means clustering failed: {e}")))?;
    let labels: Array1<usize> = model.predict(&dataset);

    let mut buckets: Vec<Vec<Point>> = vec![Vec::new(); k];
    for (point, &label) in points.iter().zip(labels.iter()) {
        buckets[label].push(*point);
    }

    let mut groups: Vec<Group> = buckets
        .into_iter()
        .filter(|members| !members.is_empty())
        .map(Group::new)
        .collect();

    if order_by_centroid {
        groups.sort_by(|a, b| {
            let (a_lat, a_lng) = a.centroid();
            let (b_lat, b_lng) = b.centroid();
            a_lat
                .total_cmp(&b_lat)
                .then(a_lng.total_cmp(&b_lng))
                .then(a.original_index(0).cmp(&b.original_index(0)))
        });
    }

    Ok(groups)
}

fn distinct_locations(points: &[Point]) -> usize {
    points
        .iter()
        .map(|p| (p.lat.to_bits(), p.lng.to_bits()))
        .collect::<HashSet<_>>()
        .len()
}
