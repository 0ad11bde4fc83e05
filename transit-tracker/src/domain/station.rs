//! Station and line identity types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when constructing a coordinate outside the valid ranges.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate ({lat}, {lon}): {reason}")]
pub struct InvalidCoordinate {
    lat: f64,
    lon: f64,
    reason: &'static str,
}

/// Unique identifier of a station record.
///
/// Two records with different ids may still describe the same physical
/// platform complex (an interchange pair); see [`Station::is_same_place`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u32);

impl StationId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a line (e.g. "blue", "L2").
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(String);

impl LineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineId({})", self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A WGS84 latitude/longitude pair in degrees.
///
/// # Examples
///
/// ```
/// use transit_tracker::domain::Coordinate;
///
/// let c = Coordinate::new(28.6139, 77.2090).unwrap();
/// assert_eq!(c.lat(), 28.6139);
///
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// assert!(Coordinate::new(0.0, 181.0).is_err());
/// assert!(Coordinate::new(f64::NAN, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting NaN and out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinate> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(InvalidCoordinate {
                lat,
                lon,
                reason: "must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidCoordinate {
                lat,
                lon,
                reason: "latitude must be within -90..=90",
            });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidCoordinate {
                lat,
                lon,
                reason: "longitude must be within -180..=180",
            });
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

#[derive(Serialize, Deserialize)]
struct RawCoordinate {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = InvalidCoordinate;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.lat, raw.lon)
    }
}

impl From<Coordinate> for RawCoordinate {
    fn from(c: Coordinate) -> Self {
        RawCoordinate {
            lat: c.lat,
            lon: c.lon,
        }
    }
}

/// A station record: one platform on one line.
///
/// Immutable after load. Stations with the same `name` on different lines
/// form an interchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub line: LineId,
    pub line_color: String,
    /// Position within the line; adjacent stations differ by exactly one.
    pub sequence: u32,
    pub location: Coordinate,
    #[serde(default)]
    pub is_interchange: bool,
}

impl Station {
    /// True if both records describe the same physical platform complex.
    pub fn is_same_place(&self, other: &Station) -> bool {
        self.name == other.name
    }
}
