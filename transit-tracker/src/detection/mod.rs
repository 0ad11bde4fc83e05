//! Station detection engine.
//!
//! Online updates are checked only against a short window of the planned
//! path so a single noisy fix cannot jump the traveler far down the line.
//! After a GPS gap, a wide bounding-box search over the whole network finds
//! where the traveler resurfaced.

mod config;
mod engine;

pub use config::{ConfidenceBand, DetectionConfig};
pub use engine::{DetectionResult, GapRecovery, StationDetectionEngine};
