//! Web layer for the transit tracker.
//!
//! JSON endpoints for route planning and live journey tracking.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
