//! Store error types.

use crate::domain::JourneyId;

/// Errors from the checkpoint and journey stores.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// No journey with this id
    #[error("journey {0} not found")]
    JourneyNotFound(JourneyId),

    /// Checkpoint sequence would leave a gap
    #[error("checkpoint sequence gap for journey {journey}: expected {expected}, got {got}")]
    SequenceGap {
        journey: JourneyId,
        expected: u64,
        got: u64,
    },

    /// A different checkpoint already holds this sequence number
    #[error("conflicting checkpoint {sequence} for journey {journey}")]
    ConflictingCheckpoint { journey: JourneyId, sequence: u64 },

    /// Checkpoint belongs to another journey than the batch
    #[error("checkpoint for journey {got} committed under journey {expected}")]
    JourneyMismatch { expected: JourneyId, got: JourneyId },
}
