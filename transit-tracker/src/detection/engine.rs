//! Proximity matching of location fixes against stations.

use tracing::trace;

use crate::domain::{Coordinate, Station, StationId};
use crate::network::{BoundingBox, haversine_m};
use crate::store::StationStore;

use super::config::DetectionConfig;

/// Result of online detection against the lookahead window.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// Matched station, if any was within range.
    pub station: Option<Station>,
    /// Index of the matched station in the planned path.
    pub path_index: Option<usize>,
    /// In `[0, 1]`; zero exactly when `station` is `None`.
    pub confidence: f64,
    pub distance_m: Option<f64>,
    /// Candidate stations that were checked, in window order.
    pub checked: Vec<StationId>,
    /// True if the match is the final station of the planned path.
    pub is_destination: bool,
}

impl DetectionResult {
    fn none(checked: Vec<StationId>) -> Self {
        Self {
            station: None,
            path_index: None,
            confidence: 0.0,
            distance_m: None,
            checked,
            is_destination: false,
        }
    }

    pub fn is_match(&self) -> bool {
        self.station.is_some()
    }
}

/// Result of the wide search after a GPS gap.
#[derive(Debug, Clone, PartialEq)]
pub struct GapRecovery {
    /// Nearest station to the fix inside the recovery box.
    pub station: Station,
    pub distance_m: f64,
    pub confidence: f64,
    /// Position of `station` in the planned path, by id or else by name.
    pub path_index: Option<usize>,
    /// Planned stations strictly between the last known station and
    /// `station`. Empty unless `station` lies ahead on the path.
    pub inferred: Vec<Station>,
    /// True if `station` is not on the planned path.
    pub divergence_detected: bool,
}

/// Matches location fixes against stations.
#[derive(Debug, Clone, Default)]
pub struct StationDetectionEngine {
    config: DetectionConfig,
}

impl StationDetectionEngine {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Indexes of the planned stations checked for a given position.
    ///
    /// The last visited station, the next `lookahead` stations, and the
    /// destination, without duplicates.
    pub fn window(&self, path_len: usize, last_visited_index: usize) -> Vec<usize> {
        if path_len == 0 {
            return Vec::new();
        }
        let start = last_visited_index.min(path_len - 1);
        let end = start.saturating_add(self.config.lookahead).min(path_len - 1);
        let mut window: Vec<usize> = (start..=end).collect();
        let destination = path_len - 1;
        if !window.contains(&destination) {
            window.push(destination);
        }
        window
    }

    /// Find the nearest in-range station in the lookahead window.
    ///
    /// Ties go to the earlier window entry.
    pub fn detect_in_range(
        &self,
        location: Coordinate,
        planned: &[Station],
        last_visited_index: usize,
    ) -> DetectionResult {
        let window = self.window(planned.len(), last_visited_index);
        let checked: Vec<StationId> = window.iter().map(|&idx| planned[idx].id).collect();

        let mut best: Option<(usize, f64)> = None;
        for &idx in &window {
            let distance = haversine_m(location, planned[idx].location);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((idx, distance));
            }
        }

        let Some((idx, distance)) = best else {
            return DetectionResult::none(checked);
        };
        let Some(confidence) = self.config.confidence_for(distance) else {
            trace!(nearest = %planned[idx].id, distance_m = distance, "no station in range");
            return DetectionResult::none(checked);
        };

        trace!(station = %planned[idx].id, distance_m = distance, confidence, "station in range");
        DetectionResult {
            station: Some(planned[idx].clone()),
            path_index: Some(idx),
            confidence,
            distance_m: Some(distance),
            checked,
            is_destination: idx == planned.len() - 1,
        }
    }

    /// Find the nearest station anywhere near the fix after a GPS gap.
    ///
    /// Searches every station in the recovery box, not just the planned
    /// path. Returns `None` if the box holds no station.
    pub fn recover_after_gap<S: StationStore + ?Sized>(
        &self,
        location: Coordinate,
        last_known: StationId,
        planned: &[Station],
        stations: &S,
    ) -> Option<GapRecovery> {
        let bbox = BoundingBox::around(location, self.config.recovery_box_degrees);

        let mut best: Option<(&Station, f64)> = None;
        for station in stations.within(&bbox) {
            let distance = haversine_m(location, station.location);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((station, distance));
            }
        }
        let (station, distance_m) = best?;

        let confidence = self
            .config
            .confidence_for(distance_m)
            .unwrap_or(self.config.recovery_fallback_confidence);
        let path_index = position_in_path(planned, station);
        let last_index = planned.iter().position(|s| s.id == last_known);

        let inferred = match (last_index, path_index) {
            (Some(from), Some(to)) if to > from => planned[from + 1..to].to_vec(),
            _ => Vec::new(),
        };

        trace!(
            station = %station.id,
            distance_m,
            confidence,
            on_path = path_index.is_some(),
            inferred = inferred.len(),
            "gap recovery match"
        );
        Some(GapRecovery {
            station: station.clone(),
            distance_m,
            confidence,
            path_index,
            inferred,
            divergence_detected: path_index.is_none(),
        })
    }
}

/// Index of `station` in `planned`, matching by id first and then by name
/// so that an interchange twin of a planned stop counts as on the path.
fn position_in_path(planned: &[Station], station: &Station) -> Option<usize> {
    planned
        .iter()
        .position(|s| s.id == station.id)
        .or_else(|| planned.iter().position(|s| s.is_same_place(station)))
}
