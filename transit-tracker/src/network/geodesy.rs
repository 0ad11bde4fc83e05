//! Great-circle distances and bounding boxes.
//!
//! Distances use the haversine formula on a spherical Earth, which is well
//! within GPS noise at station-geofence scales.

use geo::{HaversineDistance, Point};

use crate::domain::Coordinate;

/// Haversine distance between two coordinates in metres.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    to_point(a).haversine_distance(&to_point(b))
}

fn to_point(c: Coordinate) -> Point {
    Point::new(c.lon(), c.lat())
}

/// Axis-aligned box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Box extending `half_extent_deg` in each direction from `center`.
    pub fn around(center: Coordinate, half_extent_deg: f64) -> Self {
        Self {
            min_lat: center.lat() - half_extent_deg,
            max_lat: center.lat() + half_extent_deg,
            min_lon: center.lon() - half_extent_deg,
            max_lon: center.lon() + half_extent_deg,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, c: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&c.lat())
            && (self.min_lon..=self.max_lon).contains(&c.lon())
    }
}
