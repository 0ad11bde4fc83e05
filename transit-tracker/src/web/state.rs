//! Application state for the web layer.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::network::StationGraph;
use crate::planner::{CachedRoutePlanner, RoutePlanner};
use crate::store::{Clock, MemoryStore};
use crate::tracking::{JourneyStateManager, JourneyTracker};

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// The station network
    pub graph: Arc<StationGraph>,

    /// Route planner with caching
    pub planner: Arc<CachedRoutePlanner>,

    /// Live journey tracking
    pub tracker: Arc<JourneyTracker<MemoryStore>>,
}

impl AppState {
    /// Wire up planner, state manager and tracker over `graph`.
    pub fn new(graph: StationGraph, config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let graph = Arc::new(graph);
        let planner = RoutePlanner::new(graph.as_ref(), config.planner.clone());
        let cached = Arc::new(CachedRoutePlanner::new(planner.clone(), &config.cache));
        let manager = JourneyStateManager::new(
            graph.clone(),
            planner,
            config.detection.clone(),
            config.tracking.clone(),
            clock,
        );
        let tracker = JourneyTracker::new(MemoryStore::new(), cached.clone(), manager);

        Self {
            graph,
            planner: cached,
            tracker: Arc::new(tracker),
        }
    }
}
