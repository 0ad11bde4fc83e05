//! The static rail network.
//!
//! Provides an immutable snapshot of stations and lines, plus the
//! geodesy helpers used by station detection.

mod geodesy;
mod graph;
mod snapshot;

pub use geodesy::{BoundingBox, haversine_m};
pub use graph::StationGraph;
pub use snapshot::{NetworkSnapshot, SnapshotError};
