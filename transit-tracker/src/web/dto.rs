//! Data transfer objects for web requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Route, RoutePreference, Station, StationId};

/// Request to plan a route or start a journey.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub source: StationId,
    pub destination: StationId,

    /// Defaults to `SHORTEST_PATH`
    #[serde(default)]
    pub preference: RoutePreference,
}

/// A station in responses.
#[derive(Debug, Serialize)]
pub struct StationResult {
    pub id: StationId,
    pub name: String,
    pub line: String,
    pub line_color: String,
    pub sequence: u32,
    pub lat: f64,
    pub lon: f64,
    pub is_interchange: bool,
}

impl StationResult {
    pub fn from_station(station: &Station) -> Self {
        Self {
            id: station.id,
            name: station.name.clone(),
            line: station.line.to_string(),
            line_color: station.line_color.clone(),
            sequence: station.sequence,
            lat: station.location.lat(),
            lon: station.location.lon(),
            is_interchange: station.is_interchange,
        }
    }
}

/// Response listing stations.
#[derive(Debug, Serialize)]
pub struct StationsResponse {
    pub stations: Vec<StationResult>,
}

/// One line of a planned route.
#[derive(Debug, Serialize)]
pub struct SegmentResult {
    pub line: String,
    pub line_color: String,
    pub stations: Vec<StationId>,
}

/// A planned route.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub stations: Vec<StationResult>,
    pub segments: Vec<SegmentResult>,
    pub interchanges: usize,
    pub estimated_minutes: u32,
}

impl RouteResponse {
    pub fn from_route(route: &Route) -> Self {
        Self {
            stations: route
                .stations()
                .iter()
                .map(StationResult::from_station)
                .collect(),
            segments: route
                .segments()
                .iter()
                .map(|seg| SegmentResult {
                    line: seg.line.to_string(),
                    line_color: seg.line_color.clone(),
                    stations: seg.stations.iter().map(|s| s.id).collect(),
                })
                .collect(),
            interchanges: route.interchange_count(),
            estimated_minutes: route.estimated_minutes(),
        }
    }
}

/// A location fix from the traveler's device.
#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub lat: f64,
    pub lon: f64,

    /// When the fix was taken (defaults to now)
    pub timestamp: Option<DateTime<Utc>>,
}

/// Manual arrival confirmation.
#[derive(Debug, Deserialize)]
pub struct ManualArrivalRequest {
    pub station: StationId,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_request_defaults_preference() {
        let req: RouteRequest = serde_json::from_str(r#"{"source": 1, "destination": 4}"#).unwrap();
        assert_eq!(req.source, StationId(1));
        assert_eq!(req.preference, RoutePreference::ShortestPath);

        let req: RouteRequest = serde_json::from_str(
            r#"{"source": 1, "destination": 4, "preference": "LEAST_INTERCHANGES"}"#,
        )
        .unwrap();
        assert_eq!(req.preference, RoutePreference::LeastInterchanges);
    }

    #[test]
    fn location_request_optional_fields() {
        let req: LocationRequest =
            serde_json::from_str(r#"{"lat": 28.6, "lon": 77.2}"#).unwrap();
        assert!(req.timestamp.is_none());

        let req: LocationRequest = serde_json::from_str(
            r#"{"lat": 28.6, "lon": 77.2, "timestamp": "2024-03-01T08:15:00Z"}"#,
        )
        .unwrap();
        assert_eq!(
            req.timestamp,
            Some(DateTime::from_timestamp(1_709_280_900, 0).unwrap())
        );
    }
}
