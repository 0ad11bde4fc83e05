//! Shared test network for tracking tests.
//!
//! ```text
//! red:    A(1) - B(2) - C(3) - D(4) - E(5)       lon 77.0, lat 28.00..28.04
//! blue:   B(10) - X(11) - Y(12) - E(13)          X, Y at lon 77.03
//! island: Z(30)                                  unreachable
//! ```
//!
//! [`long_line`] is a separate eight-station line, G1(51) to G8(58).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::detection::DetectionConfig;
use crate::domain::{Coordinate, LineId, LocationSample, Station, StationId};
use crate::network::StationGraph;
use crate::planner::{PlannerConfig, RoutePlanner};
use crate::store::{ManualClock, StationStore};

use super::{JourneyStateManager, TrackingConfig};

fn at(id: u32, name: &str, line: &str, seq: u32, lat: f64, lon: f64) -> Station {
    Station {
        id: StationId(id),
        name: name.to_string(),
        line: LineId::new(line),
        line_color: String::new(),
        sequence: seq,
        location: Coordinate::new(lat, lon).unwrap(),
        is_interchange: false,
    }
}

pub fn network() -> Arc<StationGraph> {
    Arc::new(
        StationGraph::from_stations(vec![
            at(1, "A", "red", 1, 28.00, 77.0),
            at(2, "B", "red", 2, 28.01, 77.0),
            at(3, "C", "red", 3, 28.02, 77.0),
            at(4, "D", "red", 4, 28.03, 77.0),
            at(5, "E", "red", 5, 28.04, 77.0),
            at(10, "B", "blue", 1, 28.01, 77.0001),
            at(11, "X", "blue", 2, 28.02, 77.03),
            at(12, "Y", "blue", 3, 28.03, 77.03),
            at(13, "E", "blue", 4, 28.04, 77.0001),
            at(30, "Z", "island", 1, 28.02, 77.06),
        ])
        .unwrap(),
    )
}

pub fn long_line() -> Arc<StationGraph> {
    let stations = (1..=8)
        .map(|seq| {
            let lat = 28.10 + 0.01 * f64::from(seq - 1);
            at(50 + seq, &format!("G{seq}"), "green", seq, lat, 77.2)
        })
        .collect();
    Arc::new(StationGraph::from_stations(stations).unwrap())
}

pub fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(t0()))
}

pub fn planner(graph: &StationGraph) -> RoutePlanner {
    RoutePlanner::new(graph, PlannerConfig::default())
}

pub fn manager(graph: &Arc<StationGraph>, clock: &Arc<ManualClock>) -> JourneyStateManager {
    JourneyStateManager::new(
        graph.clone(),
        planner(graph),
        DetectionConfig::default(),
        TrackingConfig::default(),
        clock.clone(),
    )
}

/// A fix exactly on the given station.
pub fn fix(graph: &StationGraph, station: u32, at: DateTime<Utc>) -> LocationSample {
    let location = graph
        .by_id(StationId(station))
        .map(|s| s.location)
        .unwrap();
    LocationSample::new(location, at)
}

pub fn ids(stations: &[Station]) -> Vec<StationId> {
    stations.iter().map(|s| s.id).collect()
}
