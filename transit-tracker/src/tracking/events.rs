//! Results of processing a tracking input.

use serde::Serialize;

use crate::domain::{DivergenceRecord, Station, StationId};
use crate::recovery::Resolution;
use crate::store::CommitBatch;

use super::state::JourneyState;

/// What one update established.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingEvent {
    /// Nothing new this tick.
    NoDetection { checked: Vec<StationId> },

    /// Still at the last detected station.
    SameStation { station: StationId },

    /// Reached the next station while online.
    NewStationDetected {
        station: Station,
        confidence: f64,
        is_destination: bool,
    },

    /// Resurfaced on the planned path after a GPS gap.
    GpsRecoveredOnPath {
        station: Station,
        confidence: f64,
        /// Stations passed during the gap.
        inferred: Vec<StationId>,
        is_destination: bool,
    },

    /// Resurfaced off the planned path after a GPS gap.
    GpsRecoveredWithDivergence {
        station: Station,
        confidence: f64,
        /// The re-planned path; empty when unresolved.
        new_path: Vec<Station>,
        record: DivergenceRecord,
        resolution: Resolution,
        is_destination: bool,
    },

    /// Traveler confirmed a station by hand.
    ManualArrival {
        station: Station,
        /// Planned stations skipped over by the confirmation.
        inferred: Vec<StationId>,
        is_destination: bool,
    },
}

impl TrackingEvent {
    /// True if this event finished the journey.
    pub fn reached_destination(&self) -> bool {
        match self {
            TrackingEvent::NoDetection { .. } | TrackingEvent::SameStation { .. } => false,
            TrackingEvent::NewStationDetected { is_destination, .. }
            | TrackingEvent::GpsRecoveredOnPath { is_destination, .. }
            | TrackingEvent::GpsRecoveredWithDivergence { is_destination, .. }
            | TrackingEvent::ManualArrival { is_destination, .. } => *is_destination,
        }
    }
}

/// Event plus the writes needed to persist it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingOutcome {
    pub event: TrackingEvent,
    /// `None` when nothing changed.
    pub commit: Option<CommitBatch>,
    /// Transient states passed through, in order.
    pub transitions: Vec<JourneyState>,
}

impl TrackingOutcome {
    pub(super) fn unchanged(event: TrackingEvent) -> Self {
        Self {
            event,
            commit: None,
            transitions: Vec::new(),
        }
    }
}
