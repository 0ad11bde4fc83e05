//! Journey types.
//!
//! A `Journey` is a traveler session from a source station to a destination,
//! carrying the append-only list of visited stations.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RoutePreference, StationId};

/// Identifier of a journey, assigned by the journey store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JourneyId(pub u64);

impl fmt::Debug for JourneyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JourneyId({})", self.0)
    }
}

impl fmt::Display for JourneyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStatus {
    Active,
    Completed,
    Cancelled,
}

impl JourneyStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JourneyStatus::Active)
    }
}

impl fmt::Display for JourneyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JourneyStatus::Active => "active",
            JourneyStatus::Completed => "completed",
            JourneyStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Parameters for creating a journey; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewJourney {
    pub source: StationId,
    pub destination: StationId,
    pub preference: RoutePreference,
    pub started_at: DateTime<Utc>,
}

/// A traveler session.
///
/// # Invariants
///
/// - `visited` is non-empty and starts with `source`
/// - no two consecutive entries of `visited` are equal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journey {
    pub id: JourneyId,
    pub source: StationId,
    pub destination: StationId,
    pub preference: RoutePreference,
    pub started_at: DateTime<Utc>,
    pub status: JourneyStatus,
    visited: Vec<StationId>,
}

impl Journey {
    /// Create an active journey whose visited list holds only the source.
    pub fn new(id: JourneyId, new: NewJourney) -> Self {
        Self {
            id,
            source: new.source,
            destination: new.destination,
            preference: new.preference,
            started_at: new.started_at,
            status: JourneyStatus::Active,
            visited: vec![new.source],
        }
    }

    /// Stations reached so far, in detection order.
    pub fn visited(&self) -> &[StationId] {
        &self.visited
    }

    /// The most recently visited station.
    pub fn last_visited(&self) -> StationId {
        self.visited.last().copied().unwrap_or(self.source)
    }

    /// Append a station to the visited list.
    ///
    /// Returns `false` without changing anything if `station` is already the
    /// last entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use transit_tracker::domain::{Journey, JourneyId, NewJourney, RoutePreference, StationId};
    ///
    /// let mut journey = Journey::new(
    ///     JourneyId(1),
    ///     NewJourney {
    ///         source: StationId(1),
    ///         destination: StationId(5),
    ///         preference: RoutePreference::ShortestPath,
    ///         started_at: Utc::now(),
    ///     },
    /// );
    ///
    /// assert!(journey.record_visit(StationId(2)));
    /// assert!(!journey.record_visit(StationId(2)));
    /// assert_eq!(journey.visited(), &[StationId(1), StationId(2)]);
    /// ```
    pub fn record_visit(&mut self, station: StationId) -> bool {
        if self.visited.last() == Some(&station) {
            return false;
        }
        self.visited.push(station);
        true
    }

    /// Replace the visited list wholesale, as a store does on load.
    ///
    /// Consecutive duplicates are dropped; an empty list resets to `[source]`.
    pub fn with_visited(mut self, visited: Vec<StationId>) -> Self {
        let source = self.source;
        self.visited = vec![source];
        for station in visited.into_iter().skip_while(|s| *s == source) {
            self.record_visit(station);
        }
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == JourneyStatus::Active
    }
}
