//! Loading station snapshots from disk.
//!
//! The snapshot file is JSON of the form `{"stations": [Station, ...]}`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, Station};

use super::StationGraph;

/// Errors from loading a network snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The file could not be read
    #[error("failed to read network snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid snapshot JSON
    #[error("failed to parse network snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The stations violate a network invariant
    #[error("invalid network snapshot: {0}")]
    Invalid(#[from] DomainError),
}

/// On-disk representation of the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub stations: Vec<Station>,
}

impl NetworkSnapshot {
    /// Parse a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Validate and index the snapshot.
    pub fn into_graph(self) -> Result<StationGraph, SnapshotError> {
        Ok(StationGraph::from_stations(self.stations)?)
    }
}

impl StationGraph {
    /// Load and validate a network snapshot file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        NetworkSnapshot::load(path)?.into_graph()
    }
}
