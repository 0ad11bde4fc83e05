//! Route planner using Dijkstra over a line-aware station graph.
//!
//! This module answers: "which stations do I pass through to get from A to
//! B?" under one of two cost policies. Graph nodes are `(station, line)`
//! pairs so that the same physical place can be reached from several lines
//! with different costs.

mod cache;
mod config;
mod graph;
mod search;

pub use cache::{CacheConfig, CachedRoutePlanner};
pub use config::PlannerConfig;
pub use search::{PlanError, RoutePlanner};
