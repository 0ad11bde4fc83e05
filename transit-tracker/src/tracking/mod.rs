//! Journey state management.
//!
//! [`JourneyStateManager`] turns location fixes into tracking events for a
//! single session. [`JourneyTracker`] runs many sessions, serializing the
//! updates of each journey and persisting what the manager produces.

mod config;
mod error;
mod events;
mod manager;
mod service;
mod state;

#[cfg(test)]
mod fixtures;

pub use config::TrackingConfig;
pub use error::TrackingError;
pub use events::{TrackingEvent, TrackingOutcome};
pub use manager::JourneyStateManager;
pub use service::{JourneySnapshot, JourneyTracker};
pub use state::{JourneyState, TrackingSession};
