//! Station detection configuration.

/// Distance band mapping a match distance to a confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBand {
    /// Exclusive upper bound in metres.
    pub below_m: f64,
    pub confidence: f64,
}

impl ConfidenceBand {
    pub const fn new(below_m: f64, confidence: f64) -> Self {
        Self {
            below_m,
            confidence,
        }
    }
}

/// Tuning parameters for station detection.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Number of planned stations after the last visited one that are
    /// checked on each online update.
    pub lookahead: usize,

    /// Confidence bands, ordered by ascending distance. A distance beyond
    /// the last band is no match.
    pub bands: Vec<ConfidenceBand>,

    /// Half-extent in degrees of the box searched after a GPS gap.
    pub recovery_box_degrees: f64,

    /// Confidence assigned to a recovery match farther than every band.
    pub recovery_fallback_confidence: f64,
}

impl DetectionConfig {
    /// Hard ceiling on the match distance for online detection.
    pub fn max_match_distance_m(&self) -> f64 {
        self.bands.last().map_or(0.0, |band| band.below_m)
    }

    /// Confidence for a match at `distance_m`, or `None` if out of range.
    pub fn confidence_for(&self, distance_m: f64) -> Option<f64> {
        self.bands
            .iter()
            .find(|band| distance_m < band.below_m)
            .map(|band| band.confidence)
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            lookahead: 3,
            bands: vec![
                ConfidenceBand::new(100.0, 0.95),
                ConfidenceBand::new(250.0, 0.75),
                ConfidenceBand::new(400.0, 0.50),
            ],
            recovery_box_degrees: 0.02,
            recovery_fallback_confidence: 0.30,
        }
    }
}
