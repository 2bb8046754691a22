//! Per-group route solving.
//!
//! The search itself is delegated to `vrp-core`; this module only translates a
//! [`CostMatrix`] into a single-vehicle problem and reads the visiting order back.

use std::collections::HashSet;
use std::iter::once;
use std::sync::Arc;
use std::time::Instant;

use vrp_core::prelude::*;
use vrp_core::rosomaxa::evolution::TelemetryMode;

use crate::model::{CostMatrix, GroupRoute};
use route_common::{Config, Result, RouteError, RouteMode};

/// Orders the locations of one cost matrix, starting from `start`.
///
/// [`RouteMode::Closed`] routes end with `start` again (length = size + 1);
/// [`RouteMode::Open`] routes visit every location once (length = size).
/// A solve that cannot place every location fails with [`RouteError::Solver`].
pub trait RouteSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, matrix: &CostMatrix, start: usize, mode: RouteMode) -> Result<GroupRoute>;
}

/// [`RouteSolver`] backed by the `vrp-core` evolutionary solver.
#[derive(Debug, Clone)]
pub struct VrpSolver {
    /// Wall-clock budget per solve, in seconds
    max_time_secs: usize,
    max_generations: usize,
}

impl VrpSolver {
    pub fn new(max_time_secs: usize, max_generations: usize) -> Self {
        Self { max_time_secs, max_generations }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.solver_max_time_secs, config.solver_max_generations)
    }

    fn run(&self, matrix: &CostMatrix, start: usize, mode: RouteMode) -> GenericResult<Vec<usize>> {
        // the same numbers serve as durations and distances
        let routing_data = matrix.as_slice().to_vec();
        let transport: Arc<dyn TransportCost + Send + Sync> =
            Arc::new(SimpleTransportCost::new(routing_data.clone(), routing_data)?);

        let goal = define_goal(transport.clone())?;
        let problem = Arc::new(define_problem(matrix.size(), start, mode, goal, transport)?);

        let config = VrpConfigBuilder::new(problem.clone())
            .set_telemetry_mode(telemetry_mode())
            .prebuild()?
            .with_max_time(Some(self.max_time_secs))
            .with_max_generations(Some(self.max_generations))
            .build()?;

        let solution = Solver::new(problem, config).solve()?;

        if !solution.unassigned.is_empty() {
            return Err(format!("{} location(s) could not be routed", solution.unassigned.len()).into());
        }
        let route = solution.routes.first().ok_or("solver returned no route")?;

        Ok(route.tour.all_activities().map(|activity| activity.place.location).collect())
    }
}

impl RouteSolver for VrpSolver {
    fn name(&self) -> &'static str {
        "vrp-core"
    }

    fn solve(&self, matrix: &CostMatrix, start: usize, mode: RouteMode) -> Result<GroupRoute> {
        let size = matrix.size();
        if start >= size {
            return Err(RouteError::solver(format!("start {start} is outside a group of {size}")));
        }
        if size == 1 {
            return Ok(trivial_route(mode));
        }

        let started = Instant::now();
        let route = self.run(matrix, start, mode).map_err(|e| RouteError::solver(e.to_string()))?;
        check_route(&route, size, start, mode)?;
        tracing::debug!(
            size,
            stops = route.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "solved group"
        );
        Ok(route)
    }
}

/// The evolution loop stays silent; per-solve progress is reported through `tracing`.
fn telemetry_mode() -> TelemetryMode {
    TelemetryMode::None
}

fn trivial_route(mode: RouteMode) -> GroupRoute {
    match mode {
        RouteMode::Closed => vec![0, 0],
        RouteMode::Open => vec![0],
    }
}

/// One vehicle leaving `start` (and returning there for closed tours); one job per other location.
fn define_problem(
    size: usize,
    start: usize,
    mode: RouteMode,
    goal: GoalContext,
    transport: Arc<dyn TransportCost + Send + Sync>,
) -> GenericResult<Problem> {
    let jobs = (0..size)
        .filter(|&location| location != start)
        .map(|location| {
            SingleBuilder::default()
                .id(format!("stop{location}").as_str())
                .location(location)?
                .build_as_job()
        })
        .collect::<GenericResult<Vec<_>>>()?;

    let detail = match mode {
        RouteMode::Closed => VehicleDetailBuilder::default().set_start_location(start).set_end_location(start),
        RouteMode::Open => VehicleDetailBuilder::default().set_start_location(start),
    }
    .build()?;

    let vehicle = VehicleBuilder::default().id("courier").add_detail(detail).build()?;

    ProblemBuilder::default()
        .add_jobs(jobs.into_iter())
        .add_vehicles(once(vehicle))
        .with_goal(goal)
        .with_transport_cost(transport)
        .build()
}

/// Every location assigned first, shortest distance second.
fn define_goal(transport: Arc<dyn TransportCost + Send + Sync>) -> GenericResult<GoalContext> {
    let minimize_unassigned = MinimizeUnassignedBuilder::new("min-unassigned").build()?;
    let transport_feature = TransportFeatureBuilder::new("min-distance")
        .set_transport_cost(transport)
        .set_time_constrained(false)
        .build_minimize_distance()?;

    GoalContextBuilder::with_features(&[minimize_unassigned, transport_feature])?.build()
}

/// Confirms the solver answer is a permutation of the group starting at `start`.
fn check_route(route: &[usize], size: usize, start: usize, mode: RouteMode) -> Result<()> {
    let visits = match mode {
        RouteMode::Closed => {
            if route.len() != size + 1 || route.last() != Some(&start) {
                return Err(RouteError::solver(format!(
                    "closed tour over {size} locations came back with {} stops",
                    route.len()
                )));
            }
            &route[..size]
        }
        RouteMode::Open => {
            if route.len() != size {
                return Err(RouteError::solver(format!(
                    "open path over {size} locations came back with {} stops",
                    route.len()
                )));
            }
            route
        }
    };

    if visits.first() != Some(&start) {
        return Err(RouteError::solver("route does not begin at the start location"));
    }
    let distinct: HashSet<usize> = visits.iter().copied().collect();
    if distinct.len() != size || visits.iter().any(|&i| i >= size) {
        return Err(RouteError::solver("route is not a permutation of the group"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver() -> VrpSolver {
        VrpSolver::new(2, 20)
    }

    #[rustfmt::skip]
    fn line_matrix() -> CostMatrix {
        // four stops on a line: 0 - 1 - 2 - 3
        CostMatrix::from_rows(vec![
            vec![  0.0, 10.0, 20.0, 30.0],
            vec![ 10.0,  0.0, 10.0, 20.0],
            vec![ 20.0, 10.0,  0.0, 10.0],
            vec![ 30.0, 20.0, 10.0,  0.0],
        ])
        .unwrap()
    }

    #[test]
    fn open_path_visits_each_location_once() {
        let route = solver().solve(&line_matrix(), 0, RouteMode::Open).unwrap();
        assert_eq!(route, vec![0, 1, 2, 3]);
    }

    #[test]
    fn closed_tour_returns_to_start() {
        let route = solver().solve(&line_matrix(), 0, RouteMode::Closed).unwrap();
        assert_eq!(route.len(), 5);
        assert_eq!(route.first(), Some(&0));
        assert_eq!(route.last(), Some(&0));
        let mut visited = route[..4].to_vec();
        visited.sort_unstable();
        assert_eq!(visited, vec![0, 1, 2, 3]);
    }

    #[test]
    fn two_locations() {
        let matrix = CostMatrix::from_rows(vec![vec![0.0, 100.0], vec![100.0, 0.0]]).unwrap();
        assert_eq!(solver().solve(&matrix, 0, RouteMode::Closed).unwrap(), vec![0, 1, 0]);
        assert_eq!(solver().solve(&matrix, 0, RouteMode::Open).unwrap(), vec![0, 1]);
    }

    #[test]
    fn single_location_needs_no_search() {
        let matrix = CostMatrix::from_rows(vec![vec![0.0]]).unwrap();
        assert_eq!(solver().solve(&matrix, 0, RouteMode::Closed).unwrap(), vec![0, 0]);
        assert_eq!(solver().solve(&matrix, 0, RouteMode::Open).unwrap(), vec![0]);
    }

    #[test]
    fn start_outside_matrix_is_rejected() {
        let err = solver().solve(&line_matrix(), 4, RouteMode::Open).unwrap_err();
        assert!(matches!(err, RouteError::Solver(_)));
    }

    #[test]
    fn search_runs_without_solver_telemetry() {
        assert!(matches!(telemetry_mode(), TelemetryMode::None));
    }

    #[test]
    fn malformed_answers_are_rejected() {
        assert!(check_route(&[0, 1, 2], 3, 0, RouteMode::Open).is_ok());
        assert!(check_route(&[0, 2, 1, 0], 3, 0, RouteMode::Closed).is_ok());
        assert!(check_route(&[0, 1], 3, 0, RouteMode::Open).is_err());
        assert!(check_route(&[0, 1, 1], 3, 0, RouteMode::Open).is_err());
        assert!(check_route(&[1, 0, 2], 3, 0, RouteMode::Open).is_err());
        assert!(check_route(&[0, 1, 2], 3, 0, RouteMode::Closed).is_err());
        assert!(check_route(&[0, 1, 5, 0], 3, 0, RouteMode::Closed).is_err());
    }
}
