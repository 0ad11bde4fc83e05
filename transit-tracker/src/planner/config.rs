//! Route planner configuration.

use crate::domain::RoutePreference;

/// Cost parameters for route planning.
///
/// Costs are measured in hops: moving between adjacent stations on one line
/// costs 1. Changing lines costs the interchange penalty of the chosen
/// preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Interchange penalty under [`RoutePreference::ShortestPath`].
    pub shortest_path_interchange_penalty: u32,

    /// Interchange penalty under [`RoutePreference::LeastInterchanges`].
    /// Should exceed the longest possible hop count so that any route with
    /// fewer interchanges wins.
    pub least_interchanges_penalty: u32,

    /// ETA heuristic: minutes per station on the path.
    pub minutes_per_station: u32,

    /// ETA heuristic: minutes per line change.
    pub minutes_per_interchange: u32,
}

impl PlannerConfig {
    /// Create a new configuration with the given penalties and default ETA
    /// parameters.
    pub fn new(shortest_path_interchange_penalty: u32, least_interchanges_penalty: u32) -> Self {
        Self {
            shortest_path_interchange_penalty,
            least_interchanges_penalty,
            ..Self::default()
        }
    }

    /// Returns the interchange penalty for a preference.
    pub fn interchange_penalty(&self, preference: RoutePreference) -> u32 {
        match preference {
            RoutePreference::ShortestPath => self.shortest_path_interchange_penalty,
            RoutePreference::LeastInterchanges => self.least_interchanges_penalty,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            shortest_path_interchange_penalty: 6,
            least_interchanges_penalty: 100,
            minutes_per_station: 2,
            minutes_per_interchange: 5,
        }
    }
}
