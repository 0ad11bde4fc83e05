//! Checkpoints and divergence records.
//!
//! Both are immutable audit records attached to a journey.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Coordinate, JourneyId, StationId};

/// How a station arrival was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionMethod {
    /// Direct match of a location fix against a station geofence.
    Gps,
    /// Inferred from surrounding observations, with no fix of its own.
    Inferred,
    /// Inferred after a GPS gap and anchored by a later fix.
    Hybrid,
    /// Confirmed by the traveler.
    Manual,
}

/// Why a checkpoint was inferred rather than observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InferenceReason {
    /// Station passed while no location samples arrived.
    GpsGap,
    /// Station skipped by a manual confirmation further along the path.
    ManualAdvance,
}

/// Record that a station was reached.
///
/// Sequence numbers are contiguous per journey, starting at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub journey_id: JourneyId,
    pub sequence: u64,
    pub station_id: StationId,
    pub station_name: String,
    pub reached_at: DateTime<Utc>,
    pub method: DetectionMethod,
    pub confidence: f64,
    pub location: Option<Coordinate>,
    pub inference_reason: Option<InferenceReason>,
}

impl Checkpoint {
    pub fn is_inferred(&self) -> bool {
        self.inference_reason.is_some()
    }
}

/// Why the planned path was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DivergenceReason {
    /// Recovered fix landed on a station outside the planned path.
    OffRouteAfterGpsGap,
}

/// Audit record of a detected divergence from the planned path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceRecord {
    pub journey_id: JourneyId,
    pub last_known: StationId,
    pub detected: StationId,
    /// Stations inferred to bridge `last_known` and `detected`, exclusive.
    pub inferred_bridge: Vec<StationId>,
    pub reason: DivergenceReason,
    pub recorded_at: DateTime<Utc>,
}
