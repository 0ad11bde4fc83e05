//! Domain types for the transit tracker.
//!
//! Plain value types with no behavior beyond construction-time validation
//! and the visited-list invariant. Algorithms live in `planner`,
//! `detection`, `recovery`, and `tracking`.

mod checkpoint;
mod error;
mod journey;
mod location;
mod route;
mod station;

pub use checkpoint::{
    Checkpoint, DetectionMethod, DivergenceReason, DivergenceRecord, InferenceReason,
};
pub use error::DomainError;
pub use journey::{Journey, JourneyId, JourneyStatus, NewJourney};
pub use location::LocationSample;
pub use route::{Route, RoutePreference, RouteSegment};
pub use station::{Coordinate, InvalidCoordinate, LineId, Station, StationId};
