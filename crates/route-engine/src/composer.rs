//! Partition → (matrix → solve) per group → stitch.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::Instrument;

use crate::distance::DistanceProvider;
use crate::model::{FinalRoute, Group, Point};
use crate::partition::Partitioner;
use crate::sanitize::{sanitize, INSUFFICIENT_POINTS_MESSAGE, MIN_POINTS};
use crate::solver::RouteSolver;
use route_common::{Config, DedupPolicy, Result, RouteError, RouteMode};

/// Every group is solved from its first member.
const GROUP_START: usize = 0;

/// Composition knobs shared by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposerSettings {
    pub partitioner: Partitioner,
    pub mode: RouteMode,
    pub dedup: DedupPolicy,
    /// Solve groups concurrently; results are still joined in partition order.
    pub parallel_groups: bool,
}

impl ComposerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            partitioner: Partitioner::from_config(config),
            mode: config.route_mode,
            dedup: config.dedup_policy,
            parallel_groups: config.parallel_groups,
        }
    }
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            partitioner: Partitioner::Single,
            mode: RouteMode::Closed,
            dedup: DedupPolicy::First,
            parallel_groups: false,
        }
    }
}

/// Runs the whole routing pipeline for one request.
///
/// Holds no per-request state, so one instance is shared by every handler.
pub struct RouteComposer {
    provider: Arc<dyn DistanceProvider>,
    solver: Arc<dyn RouteSolver>,
    settings: ComposerSettings,
}

impl RouteComposer {
    pub fn new(
        provider: Arc<dyn DistanceProvider>,
        solver: Arc<dyn RouteSolver>,
        settings: ComposerSettings,
    ) -> Self {
        Self { provider, solver, settings }
    }

    pub fn settings(&self) -> &ComposerSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    /// Sanitizes raw location records and composes a route over the survivors.
    pub async fn optimize(&self, records: &[Value]) -> Result<FinalRoute> {
        let points = sanitize(records)?;
        self.compose(&points).await
    }

    /// Composes the final route over already sanitized points.
    ///
    /// # Errors
    ///
    /// - [`RouteError::Validation`] for fewer than two points, before any collaborator is called
    /// - the first provider or solver failure of any group; no partial route is returned
    pub async fn compose(&self, points: &[Point]) -> Result<FinalRoute> {
        if points.len() < MIN_POINTS {
            return Err(RouteError::validation(INSUFFICIENT_POINTS_MESSAGE));
        }

        let groups = self.settings.partitioner.partition(points)?;
        tracing::info!(
            points = points.len(),
            groups = groups.len(),
            strategy = self.settings.partitioner.name(),
            "🧭 Composing route"
        );

        let routes = if self.settings.parallel_groups {
            try_join_all(groups.iter().enumerate().map(|(n, group)| self.route_group(n, group))).await?
        } else {
            let mut routes = Vec::with_capacity(groups.len());
            for (n, group) in groups.iter().enumerate() {
                routes.push(self.route_group(n, group).await?);
            }
            routes
        };

        let route = stitch(routes, self.settings.dedup);
        tracing::info!(stops = route.len(), "✅ Route composed");
        Ok(route)
    }

    async fn route_group(&self, n: usize, group: &Group) -> Result<Vec<usize>> {
        let span = tracing::info_span!("group", n, size = group.len());
        self.solve_group(group).instrument(span).await
    }

    /// Solves one group and returns its order in original indices.
    async fn solve_group(&self, group: &Group) -> Result<Vec<usize>> {
        let matrix = self.provider.matrix(group.points()).await.map_err(|e| {
            tracing::error!("❌ Distance matrix failed: {}", e);
            e
        })?;
        if matrix.size() != group.len() {
            return Err(RouteError::provider(format!(
                "{} returned a {}x{} matrix for {} locations",
                self.provider.name(),
                matrix.size(),
                matrix.size(),
                group.len()
            )));
        }

        // CPU-bound search runs on the blocking pool.
        let solver = Arc::clone(&self.solver);
        let mode = self.settings.mode;
        let local = tokio::task::spawn_blocking(move || solver.solve(&matrix, GROUP_START, mode))
            .await
            .map_err(|e| RouteError::internal(format!("solver task failed: {e}")))?
            .map_err(|e| {
                tracing::error!("❌ Solve failed: {}", e);
                e
            })?;

        local
            .iter()
            .map(|&i| {
                group.original_index(i).ok_or_else(|| {
                    RouteError::solver(format!("solver returned index {i} outside a group of {}", group.len()))
                })
            })
            .collect()
    }
}

/// Concatenates per-group orders, applying the dedup policy across the whole route.
pub fn stitch(routes: Vec<Vec<usize>>, dedup: DedupPolicy) -> FinalRoute {
    let all = routes.into_iter().flatten();
    match dedup {
        DedupPolicy::Verbatim => all.collect(),
        DedupPolicy::First => {
            let mut seen = HashSet::new();
            all.filter(|i| seen.insert(*i)).collect()
        }
    }
}
