//! Route engine: turns a list of raw coordinates into a visiting order.
//!
//! The pipeline is sanitize → partition → (distance matrix → solve) per group → stitch.
//! Distance sources and the routing solver sit behind the [`DistanceProvider`] and
//! [`RouteSolver`] traits so they can be swapped without touching the composition logic.

pub mod composer;
pub mod distance;
pub mod model;
pub mod partition;
pub mod sanitize;
pub mod solver;

pub use composer::{stitch, ComposerSettings, RouteComposer};
pub use distance::{provider_from_config, DistanceProvider};
pub use model::{CostMatrix, FinalRoute, Group, GroupRoute, Point};
pub use partition::Partitioner;
pub use sanitize::sanitize;
pub use solver::{RouteSolver, VrpSolver};

pub use route_common::{DedupPolicy, PartitionStrategy, ProviderKind, Result, RouteError, RouteMode};

use std::sync::Arc;

use route_common::Config;

/// Wires the configured distance provider and the `vrp-core` solver into a composer.
pub fn build_composer(config: &Config) -> Result<RouteComposer> {
    let provider = provider_from_config(config)?;
    let solver: Arc<dyn RouteSolver> = Arc::new(VrpSolver::from_config(config));
    Ok(RouteComposer::new(provider, solver, ComposerSettings::from_config(config)))
}
