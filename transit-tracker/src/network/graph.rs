//! Immutable station snapshot with lookup indexes.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::{DomainError, LineId, Station, StationId};
use crate::store::StationStore;

/// Immutable snapshot of all stations and lines.
///
/// Built once at startup and shared read-only between journeys.
#[derive(Debug, Clone, Default)]
pub struct StationGraph {
    stations: Vec<Station>,
    by_id: HashMap<StationId, usize>,
    by_name: HashMap<String, Vec<usize>>,
    /// Station indexes per line, sorted by sequence number.
    lines: BTreeMap<LineId, Vec<usize>>,
}

impl StationGraph {
    /// Build a snapshot from station records.
    ///
    /// Rejects duplicate ids and duplicate `(line, sequence)` pairs. The
    /// interchange flag is set on every station that shares its display
    /// name with a station on another line.
    pub fn from_stations(mut stations: Vec<Station>) -> Result<Self, DomainError> {
        let mut by_id = HashMap::with_capacity(stations.len());
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut lines: BTreeMap<LineId, Vec<usize>> = BTreeMap::new();
        let mut seen_positions: HashSet<(LineId, u32)> = HashSet::new();

        for (idx, station) in stations.iter().enumerate() {
            if by_id.insert(station.id, idx).is_some() {
                return Err(DomainError::DuplicateStation(station.id));
            }
            if !seen_positions.insert((station.line.clone(), station.sequence)) {
                return Err(DomainError::DuplicateSequence {
                    line: station.line.to_string(),
                    sequence: station.sequence,
                });
            }
            by_name.entry(station.name.clone()).or_default().push(idx);
            lines.entry(station.line.clone()).or_default().push(idx);
        }

        for members in lines.values_mut() {
            members.sort_by_key(|&idx| stations[idx].sequence);
        }

        for members in by_name.values() {
            let distinct_lines: HashSet<&LineId> =
                members.iter().map(|&idx| &stations[idx].line).collect();
            if distinct_lines.len() > 1 {
                for &idx in members {
                    stations[idx].is_interchange = true;
                }
            }
        }

        Ok(Self {
            stations,
            by_id,
            by_name,
            lines,
        })
    }

    /// All stations in load order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn get(&self, id: StationId) -> Option<&Station> {
        self.by_id.get(&id).map(|&idx| &self.stations[idx])
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// All station records with the given display name.
    pub fn named(&self, name: &str) -> impl Iterator<Item = &Station> {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(|&idx| &self.stations[idx])
    }

    /// Same-name stations on other lines.
    pub fn interchange_partners(&self, id: StationId) -> Vec<&Station> {
        let Some(station) = self.get(id) else {
            return Vec::new();
        };
        self.named(&station.name)
            .filter(|other| other.line != station.line)
            .collect()
    }

    /// Line identifiers in sorted order.
    pub fn line_ids(&self) -> impl Iterator<Item = &LineId> {
        self.lines.keys()
    }

    /// Stations of a line, ordered by sequence.
    pub fn line(&self, line: &LineId) -> Vec<&Station> {
        self.lines
            .get(line)
            .into_iter()
            .flatten()
            .map(|&idx| &self.stations[idx])
            .collect()
    }
}

impl StationStore for StationGraph {
    fn all_stations(&self) -> &[Station] {
        &self.stations
    }

    fn by_id(&self, id: StationId) -> Option<&Station> {
        self.get(id)
    }
}
