//! Dijkstra route search.
//!
//! Searches from every `(source, line)` node at once and stops at the first
//! settled node whose display name matches the destination, so any physical
//! variant of the destination counts as arrival.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{DomainError, Route, RoutePreference, StationId};
use crate::store::StationStore;

use super::config::PlannerConfig;
use super::graph::{EdgeKind, RouteGraph};

/// Error from route planning.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// Station id not present in the network
    #[error("unknown station {0}")]
    UnknownStation(StationId),

    /// Destination unreachable from source
    #[error("no route from {from} to {to}")]
    NoRouteFound { from: StationId, to: StationId },

    /// Search produced an invalid route
    #[error("invalid route: {0}")]
    InvalidRoute(#[from] DomainError),
}

/// Route planner over a fixed network.
///
/// Cloning is cheap; clones share the adjacency structure.
#[derive(Debug, Clone)]
pub struct RoutePlanner {
    graph: Arc<RouteGraph>,
    config: PlannerConfig,
}

impl RoutePlanner {
    /// Build a planner over every station in `stations`.
    pub fn new<S: StationStore + ?Sized>(stations: &S, config: PlannerConfig) -> Self {
        Self {
            graph: Arc::new(RouteGraph::build(stations.all_stations())),
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Find a minimum-cost route from `source` to `destination`.
    ///
    /// When `source` and `destination` are the same station (or share a
    /// display name), the route holds that single station.
    pub fn find_route(
        &self,
        source: StationId,
        destination: StationId,
        preference: RoutePreference,
    ) -> Result<Route, PlanError> {
        let seeds = self.graph.nodes_for(source);
        if seeds.is_empty() {
            return Err(PlanError::UnknownStation(source));
        }
        let target_name = &self
            .graph
            .find(destination)
            .ok_or(PlanError::UnknownStation(destination))?
            .name;

        let penalty = self.config.interchange_penalty(preference);
        let n = self.graph.node_count();
        let mut dist = vec![u32::MAX; n];
        let mut prev: Vec<Option<usize>> = vec![None; n];

        // Min-heap on (cost, node); node index breaks ties deterministically.
        let mut heap: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::new();
        for &seed in seeds {
            dist[seed] = 0;
            heap.push(Reverse((0, seed)));
        }

        let mut settled = 0usize;
        while let Some(Reverse((cost, node))) = heap.pop() {
            // Skip stale heap entries.
            if cost > dist[node] {
                continue;
            }
            settled += 1;

            if &self.graph.station(node).name == target_name {
                let route = self.reconstruct(&prev, node)?;
                debug!(
                    source = %source,
                    destination = %destination,
                    ?preference,
                    cost,
                    settled,
                    stations = route.len(),
                    interchanges = route.interchange_count(),
                    "route found"
                );
                return Ok(route);
            }

            for edge in self.graph.edges(node) {
                let step = match edge.kind {
                    EdgeKind::Hop => 1,
                    EdgeKind::Interchange => penalty,
                };
                let next = cost.saturating_add(step);
                if next < dist[edge.to] {
                    dist[edge.to] = next;
                    prev[edge.to] = Some(node);
                    heap.push(Reverse((next, edge.to)));
                }
            }
        }

        debug!(source = %source, destination = %destination, ?preference, settled, "no route");
        Err(PlanError::NoRouteFound {
            from: source,
            to: destination,
        })
    }

    /// Walk predecessor links back from `end` to a seed node.
    fn reconstruct(&self, prev: &[Option<usize>], end: usize) -> Result<Route, PlanError> {
        let mut nodes = vec![end];
        let mut cur = end;
        while let Some(p) = prev[cur] {
            nodes.push(p);
            cur = p;
        }
        nodes.reverse();

        let stations = nodes
            .into_iter()
            .map(|idx| self.graph.station(idx).clone())
            .collect();
        Ok(Route::from_path(
            stations,
            self.config.minutes_per_station,
            self.config.minutes_per_interchange,
        )?)
    }
}
