//! Tracking errors.

use chrono::{DateTime, Utc};

use crate::domain::{JourneyId, JourneyStatus, StationId};
use crate::planner::PlanError;
use crate::store::StoreError;

/// Error from journey tracking.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackingError {
    /// Sample older than the last processed one; dropped unprocessed
    #[error("stale update: sample at {sample_at} precedes {last_processed}")]
    StaleUpdate {
        sample_at: DateTime<Utc>,
        last_processed: DateTime<Utc>,
    },

    /// Journey has ended
    #[error("journey {journey} is {status}")]
    JourneyNotActive {
        journey: JourneyId,
        status: JourneyStatus,
    },

    /// Session was reset and is not tracking any journey
    #[error("journey {0} is not being tracked")]
    Idle(JourneyId),

    /// No such journey
    #[error("journey {0} not found")]
    JourneyNotFound(JourneyId),

    /// Station id not in the network
    #[error("unknown station {0}")]
    UnknownStation(StationId),

    /// Manual arrival at a station that is not ahead on the planned path
    #[error("station {0} is not ahead on the planned path")]
    NotOnPlannedPath(StationId),

    /// Persistence failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Route planning failed
    #[error(transparent)]
    Plan(#[from] PlanError),
}
