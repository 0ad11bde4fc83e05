//! Route recovery after the traveler leaves the planned path.
//!
//! Given the last station known on the path and the off-path station the
//! traveler resurfaced at, this infers how they probably got there and
//! plans the rest of the trip from where they are now.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{
    DivergenceReason, DivergenceRecord, JourneyId, RoutePreference, Station, StationId,
};
use crate::planner::RoutePlanner;

/// Whether a divergence could be re-planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resolution {
    /// A new path to the destination was found.
    Resolved,
    /// No path from the detected station to the destination. Tracking
    /// continues on the previous path.
    Unresolved,
}

/// Outcome of handling one divergence.
#[derive(Debug, Clone, PartialEq)]
pub struct DivergenceResolution {
    /// Route from the detected station to the destination, starting with the
    /// detected station. Empty when unresolved.
    pub new_path: Vec<Station>,
    pub record: DivergenceRecord,
    pub resolution: Resolution,
}

/// Re-plans journeys after a divergence.
#[derive(Debug, Clone)]
pub struct RouteRecoveryManager {
    planner: RoutePlanner,
}

impl RouteRecoveryManager {
    pub fn new(planner: RoutePlanner) -> Self {
        Self { planner }
    }

    /// Reconcile a divergence from `last_known` to `current`.
    ///
    /// The record's `inferred_bridge` holds the stations believed passed
    /// between the two, exclusive of both. Never fails: an unplannable bridge
    /// leaves it empty, and an
    /// unreachable destination yields [`Resolution::Unresolved`].
    pub fn handle_route_divergence(
        &self,
        journey_id: JourneyId,
        last_known: &Station,
        current: &Station,
        destination: StationId,
        preference: RoutePreference,
        at: DateTime<Utc>,
    ) -> DivergenceResolution {
        let bridge = self
            .planner
            .find_route(last_known.id, current.id, preference);
        let bridge: Vec<StationId> = match bridge {
            Ok(route) => {
                let stations = route.stations();
                let inner = stations.len().saturating_sub(1);
                stations.iter().take(inner).skip(1).map(|s| s.id).collect()
            }
            Err(e) => {
                debug!(journey = %journey_id, from = %last_known.id, to = %current.id, error = %e, "no bridge path");
                Vec::new()
            }
        };

        let (new_path, resolution) =
            match self.planner.find_route(current.id, destination, preference) {
                Ok(route) => (route.into_stations(), Resolution::Resolved),
                Err(e) => {
                    warn!(journey = %journey_id, from = %current.id, to = %destination, error = %e, "divergence unresolved");
                    (Vec::new(), Resolution::Unresolved)
                }
            };

        let record = DivergenceRecord {
            journey_id,
            last_known: last_known.id,
            detected: current.id,
            inferred_bridge: bridge,
            reason: DivergenceReason::OffRouteAfterGpsGap,
            recorded_at: at,
        };

        debug!(
            journey = %journey_id,
            last_known = %last_known.id,
            detected = %current.id,
            bridge = record.inferred_bridge.len(),
            new_path = new_path.len(),
            ?resolution,
            "divergence handled"
        );
        DivergenceResolution {
            new_path,
            record,
            resolution,
        }
    }
}
