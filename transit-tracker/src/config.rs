//! Process configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::detection::DetectionConfig;
use crate::planner::{CacheConfig, PlannerConfig};
use crate::tracking::TrackingConfig;

/// Listen address when `TRACKER_ADDR` is unset.
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Network snapshot path when `TRACKER_NETWORK` is unset.
pub const DEFAULT_NETWORK: &str = "data/network.json";

/// Error from reading configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set to something unparseable
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub network_path: PathBuf,
    pub planner: PlannerConfig,
    pub detection: DetectionConfig,
    pub tracking: TrackingConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `TRACKER_ADDR` | `127.0.0.1:3000` |
    /// | `TRACKER_NETWORK` | `data/network.json` |
    /// | `TRACKER_GPS_TIMEOUT_SECS` | 30 |
    /// | `TRACKER_SHORTEST_PATH_PENALTY` | 6 |
    /// | `TRACKER_LEAST_INTERCHANGES_PENALTY` | 100 |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = parse(&lookup, "TRACKER_ADDR")? {
            config.addr = addr;
        }
        if let Some(path) = lookup("TRACKER_NETWORK") {
            config.network_path = PathBuf::from(path);
        }
        if let Some(secs) = parse(&lookup, "TRACKER_GPS_TIMEOUT_SECS")? {
            config.tracking.gps_timeout_secs = secs;
        }
        if let Some(penalty) = parse(&lookup, "TRACKER_SHORTEST_PATH_PENALTY")? {
            config.planner.shortest_path_interchange_penalty = penalty;
        }
        if let Some(penalty) = parse(&lookup, "TRACKER_LEAST_INTERCHANGES_PENALTY")? {
            config.planner.least_interchanges_penalty = penalty;
        }
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            network_path: PathBuf::from(DEFAULT_NETWORK),
            planner: PlannerConfig::default(),
            detection: DetectionConfig::default(),
            tracking: TrackingConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
