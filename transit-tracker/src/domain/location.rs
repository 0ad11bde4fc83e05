//! Location samples reported by the traveler's device.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinate;

/// One location fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub location: Coordinate,
    /// When the device took the fix.
    pub recorded_at: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(location: Coordinate, recorded_at: DateTime<Utc>) -> Self {
        Self {
            location,
            recorded_at,
        }
    }
}
