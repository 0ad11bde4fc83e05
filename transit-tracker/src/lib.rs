//! Transit journey tracker.
//!
//! Plans routes over a metro network and follows a traveler along the
//! planned route from a stream of location fixes. Fixes are matched to
//! stations ahead on the route; after a GPS outage the tracker either
//! rejoins the route, filling in the skipped stations, or replans from
//! wherever the traveler turned up.

pub mod config;
pub mod detection;
pub mod domain;
pub mod network;
pub mod planner;
pub mod recovery;
pub mod store;
pub mod tracking;
pub mod web;
