//! Planned routes.
//!
//! A `Route` is an ordered path of stations, partitioned into segments
//! where each segment is a maximal run of stations on one line.

use serde::{Deserialize, Serialize};

use super::{DomainError, LineId, Station, StationId};

/// Cost policy used by the route planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutePreference {
    /// Fewest hops, with a moderate interchange penalty.
    #[default]
    ShortestPath,
    /// Fewest interchanges; hop count only breaks ties.
    LeastInterchanges,
}

/// A maximal run of consecutive path stations on one line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub line: LineId,
    pub line_color: String,
    pub stations: Vec<Station>,
}

impl RouteSegment {
    pub fn first(&self) -> Option<&Station> {
        self.stations.first()
    }

    pub fn last(&self) -> Option<&Station> {
        self.stations.last()
    }
}

/// A planned path between two stations.
///
/// # Invariants
///
/// - At least one station
/// - No two consecutive stations share a display name
/// - Segments concatenated reproduce `stations`
/// - Consecutive segments have different lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    stations: Vec<Station>,
    segments: Vec<RouteSegment>,
    estimated_minutes: u32,
}

impl Route {
    /// Build a route from a raw node path.
    ///
    /// Consecutive entries with the same display name (interchange hops) are
    /// collapsed to the first of them, then the path is split into segments
    /// at every line change.
    ///
    /// `minutes_per_station` and `minutes_per_interchange` feed the ETA
    /// heuristic only.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_tracker::domain::{Coordinate, LineId, Route, Station, StationId};
    ///
    /// let at = |id: u32, name: &str, line: &str, seq: u32| Station {
    ///     id: StationId(id),
    ///     name: name.into(),
    ///     line: LineId::new(line),
    ///     line_color: String::new(),
    ///     sequence: seq,
    ///     location: Coordinate::new(0.0, 0.0).unwrap(),
    ///     is_interchange: false,
    /// };
    ///
    /// let route = Route::from_path(
    ///     vec![
    ///         at(1, "A", "red", 1),
    ///         at(2, "B", "red", 2),
    ///         at(10, "B", "blue", 5),
    ///         at(11, "C", "blue", 6),
    ///     ],
    ///     2,
    ///     5,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(route.len(), 3);
    /// assert_eq!(route.segments().len(), 2);
    /// assert_eq!(route.interchange_count(), 1);
    /// assert_eq!(route.estimated_minutes(), 3 * 2 + 5);
    /// ```
    pub fn from_path(
        raw: Vec<Station>,
        minutes_per_station: u32,
        minutes_per_interchange: u32,
    ) -> Result<Self, DomainError> {
        let mut stations: Vec<Station> = Vec::with_capacity(raw.len());
        for station in raw {
            if stations.last().is_some_and(|prev| prev.is_same_place(&station)) {
                continue;
            }
            stations.push(station);
        }

        if stations.is_empty() {
            return Err(DomainError::EmptyRoute);
        }

        let segments = split_segments(&stations);
        let estimated_minutes = stations.len() as u32 * minutes_per_station
            + (segments.len() as u32 - 1) * minutes_per_interchange;

        Ok(Self {
            stations,
            segments,
            estimated_minutes,
        })
    }

    /// The deduplicated station path.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn segments(&self) -> &[RouteSegment] {
        &self.segments
    }

    /// Estimated travel time in minutes (display only).
    pub fn estimated_minutes(&self) -> u32 {
        self.estimated_minutes
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Always false: a route holds at least one station.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn origin(&self) -> &Station {
        &self.stations[0]
    }

    pub fn destination(&self) -> &Station {
        &self.stations[self.stations.len() - 1]
    }

    /// Number of line changes along the route.
    pub fn interchange_count(&self) -> usize {
        self.segments.len() - 1
    }

    /// Number of station-to-station moves.
    pub fn hop_count(&self) -> usize {
        self.stations.len() - 1
    }

    /// Total cost of the route under the given interchange penalty.
    pub fn cost(&self, interchange_penalty: u32) -> u32 {
        self.hop_count() as u32 + self.interchange_count() as u32 * interchange_penalty
    }

    /// Station ids along the path, in order.
    pub fn station_ids(&self) -> Vec<StationId> {
        self.stations.iter().map(|s| s.id).collect()
    }

    pub fn into_stations(self) -> Vec<Station> {
        self.stations
    }
}

fn split_segments(stations: &[Station]) -> Vec<RouteSegment> {
    let mut segments: Vec<RouteSegment> = Vec::new();
    for station in stations {
        match segments.last_mut() {
            Some(segment) if segment.line == station.line => {
                segment.stations.push(station.clone());
            }
            _ => segments.push(RouteSegment {
                line: station.line.clone(),
                line_color: station.line_color.clone(),
                stations: vec![station.clone()],
            }),
        }
    }
    segments
}
