//! Per-journey tracking state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Coordinate, Journey, JourneyId, JourneyStatus, Station, StationId};

/// Where a journey is in its tracking lifecycle.
///
/// `GpsGap` and `Diverged` are passed through while an update is processed
/// and always resolve back to `Active`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JourneyState {
    Idle,
    Active {
        journey_id: JourneyId,
        current_index: usize,
    },
    GpsGap {
        journey_id: JourneyId,
        silent_since: DateTime<Utc>,
    },
    Diverged {
        journey_id: JourneyId,
        detected: StationId,
    },
    Completed {
        journey_id: JourneyId,
    },
}

/// Mutable tracking data for one journey.
///
/// Owned by the caller and passed into every update so that journeys never
/// share state. Cloning gives an independent copy, which lets callers
/// process an update speculatively and keep the result only once it has
/// been persisted.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    pub(super) journey: Journey,
    pub(super) planned_path: Vec<Station>,
    pub(super) state: JourneyState,
    /// Index into `planned_path` of the last station reached on it.
    pub(super) current_index: usize,
    pub(super) last_detected: Option<StationId>,
    /// Clock reading when the last update was accepted.
    pub(super) last_gps_at: Option<DateTime<Utc>>,
    /// Sample timestamp of the last accepted update.
    pub(super) last_sample_at: Option<DateTime<Utc>>,
    pub(super) last_location: Option<Coordinate>,
    /// Sequence number the next checkpoint will carry.
    pub(super) next_sequence: u64,
}

impl TrackingSession {
    /// Start tracking `journey` along `planned_path`.
    ///
    /// The traveler is placed on the planned station matching the last
    /// visited one, or at the start of the path.
    pub fn new(journey: Journey, planned_path: Vec<Station>, next_sequence: u64) -> Self {
        let last = journey.last_visited();
        let current_index = planned_path
            .iter()
            .position(|s| s.id == last)
            .unwrap_or(0);
        let state = if journey.is_active() {
            JourneyState::Active {
                journey_id: journey.id,
                current_index,
            }
        } else {
            JourneyState::Idle
        };
        Self {
            journey,
            planned_path,
            state,
            current_index,
            last_detected: Some(last),
            last_gps_at: None,
            last_sample_at: None,
            last_location: None,
            next_sequence,
        }
    }

    pub fn journey(&self) -> &Journey {
        &self.journey
    }

    pub fn journey_id(&self) -> JourneyId {
        self.journey.id
    }

    pub fn planned_path(&self) -> &[Station] {
        &self.planned_path
    }

    pub fn state(&self) -> &JourneyState {
        &self.state
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn last_detected(&self) -> Option<StationId> {
        self.last_detected
    }

    pub fn last_gps_at(&self) -> Option<DateTime<Utc>> {
        self.last_gps_at
    }

    pub fn last_location(&self) -> Option<Coordinate> {
        self.last_location
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// True while updates are accepted.
    pub fn is_tracking(&self) -> bool {
        self.journey.is_active() && !matches!(self.state, JourneyState::Idle)
    }

    /// Back to `Idle`, forgetting detection history.
    pub fn reset(&mut self) {
        self.state = JourneyState::Idle;
        self.current_index = 0;
        self.last_detected = None;
        self.last_gps_at = None;
        self.last_sample_at = None;
        self.last_location = None;
    }

    /// End the journey with a terminal status.
    pub fn close(&mut self, status: JourneyStatus) {
        self.journey.status = status;
        self.state = match status {
            JourneyStatus::Completed => JourneyState::Completed {
                journey_id: self.journey.id,
            },
            JourneyStatus::Active | JourneyStatus::Cancelled => JourneyState::Idle,
        };
    }

    pub(super) fn set_active(&mut self) {
        self.state = JourneyState::Active {
            journey_id: self.journey.id,
            current_index: self.current_index,
        };
    }

    pub(super) fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }
}
