//! Domain error types.
//!
//! These errors represent validation failures in the domain layer.
//! They are distinct from store and I/O errors.

use super::StationId;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Route has no stations
    #[error("route must contain at least one station")]
    EmptyRoute,

    /// Two station records share an id
    #[error("duplicate station id {0}")]
    DuplicateStation(StationId),

    /// Two stations on one line share a sequence number
    #[error("line {line} has two stations at sequence {sequence}")]
    DuplicateSequence { line: String, sequence: u32 },
}
