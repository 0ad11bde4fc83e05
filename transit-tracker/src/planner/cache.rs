//! Caching layer for planned routes.
//!
//! The network is immutable once loaded, so a route between two stations
//! under one preference never changes. Entries still expire so that a
//! long-running server does not pin rarely used routes forever.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::domain::{Route, RoutePreference, StationId};

use super::search::{PlanError, RoutePlanner};

/// Cache key: (source, destination, preference).
type RouteKey = (StationId, StationId, RoutePreference);

/// Configuration for the route cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 1000,
        }
    }
}

/// Route planner with caching.
///
/// Only successful plans are cached; errors are recomputed every time.
pub struct CachedRoutePlanner {
    planner: RoutePlanner,
    routes: MokaCache<RouteKey, Arc<Route>>,
}

impl CachedRoutePlanner {
    pub fn new(planner: RoutePlanner, config: &CacheConfig) -> Self {
        let routes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { planner, routes }
    }

    /// Plan a route, using the cache if available.
    pub async fn find_route(
        &self,
        source: StationId,
        destination: StationId,
        preference: RoutePreference,
    ) -> Result<Arc<Route>, PlanError> {
        let key = (source, destination, preference);
        if let Some(route) = self.routes.get(&key).await {
            trace!(%source, %destination, ?preference, "route cache hit");
            return Ok(route);
        }

        let route = Arc::new(self.planner.find_route(source, destination, preference)?);
        self.routes.insert(key, Arc::clone(&route)).await;
        Ok(route)
    }

    /// The uncached planner.
    pub fn planner(&self) -> &RoutePlanner {
        &self.planner
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.routes.entry_count()
    }
}
