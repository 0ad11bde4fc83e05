//! Journey tracking configuration.

use chrono::Duration;

/// Configuration for the journey state manager.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    /// Silence longer than this (seconds) between accepted updates sends the
    /// next update down the gap-recovery branch.
    pub gps_timeout_secs: i64,

    /// Confidence recorded on stations inferred across a GPS gap.
    pub inferred_confidence: f64,
}

impl TrackingConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(gps_timeout_secs: i64, inferred_confidence: f64) -> Self {
        Self {
            gps_timeout_secs,
            inferred_confidence,
        }
    }

    /// Returns the GPS timeout as a Duration.
    pub fn gps_timeout(&self) -> Duration {
        Duration::seconds(self.gps_timeout_secs)
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            gps_timeout_secs: 30,
            inferred_confidence: 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TrackingConfig::default();

        assert_eq!(config.gps_timeout_secs, 30);
        assert_eq!(config.inferred_confidence, 0.7);
        assert_eq!(config.gps_timeout(), Duration::seconds(30));
    }

    #[test]
    fn custom_config() {
        let config = TrackingConfig::new(45, 0.6);
        assert_eq!(config.gps_timeout(), Duration::seconds(45));
        assert_eq!(config.inferred_confidence, 0.6);
    }
}
