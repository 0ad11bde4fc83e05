//! Collaborator interfaces for stations, checkpoints, journeys, and time.
//!
//! The tracking core only talks to storage through these traits, so it can
//! be exercised without a database. `MemoryStore` is the in-process
//! implementation used by the server and by tests.

mod clock;
mod error;
mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::StoreError;
pub use memory::MemoryStore;

use crate::domain::{
    Checkpoint, DivergenceRecord, Journey, JourneyId, JourneyStatus, NewJourney, Station,
    StationId,
};
use crate::network::BoundingBox;

/// Read-only station snapshot.
pub trait StationStore: Send + Sync {
    fn all_stations(&self) -> &[Station];

    fn by_id(&self, id: StationId) -> Option<&Station>;

    /// Stations whose location lies inside `bbox`, in snapshot order.
    fn within(&self, bbox: &BoundingBox) -> Vec<&Station> {
        self.all_stations()
            .iter()
            .filter(|s| bbox.contains(s.location))
            .collect()
    }
}

/// Append-only checkpoint log.
pub trait CheckpointStore: Send + Sync {
    /// Append a checkpoint. Its sequence must be one past the last stored
    /// sequence for the journey; re-appending an identical checkpoint is a
    /// no-op.
    fn append(&self, checkpoint: Checkpoint) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn last_checkpoint(
        &self,
        journey: JourneyId,
    ) -> impl Future<Output = Result<Option<Checkpoint>, StoreError>> + Send;

    /// All checkpoints of a journey in sequence order.
    fn checkpoints_for(
        &self,
        journey: JourneyId,
    ) -> impl Future<Output = Result<Vec<Checkpoint>, StoreError>> + Send;
}

/// Journey records and their divergence audit trail.
pub trait JourneyStore: Send + Sync {
    fn create(&self, new: NewJourney) -> impl Future<Output = Result<Journey, StoreError>> + Send;

    fn by_id(&self, id: JourneyId)
    -> impl Future<Output = Result<Option<Journey>, StoreError>> + Send;

    fn update_visited_list(
        &self,
        id: JourneyId,
        visited: Vec<StationId>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn update_status(
        &self,
        id: JourneyId,
        status: JourneyStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn append_divergence(
        &self,
        id: JourneyId,
        record: DivergenceRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn divergences_for(
        &self,
        id: JourneyId,
    ) -> impl Future<Output = Result<Vec<DivergenceRecord>, StoreError>> + Send;
}

/// Writes produced by one processed location update.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitBatch {
    pub journey_id: JourneyId,
    /// New checkpoints, in sequence order.
    pub checkpoints: Vec<Checkpoint>,
    /// The full visited list after this update.
    pub visited: Vec<StationId>,
    pub divergence: Option<DivergenceRecord>,
    /// Set when the update ended the journey.
    pub status: Option<JourneyStatus>,
}

/// Store that can apply a whole [`CommitBatch`].
pub trait TrackingStore: CheckpointStore + JourneyStore {
    /// Apply a batch. Implementations backed by a transactional store should
    /// apply it atomically; the default applies the writes one by one.
    fn commit(&self, batch: &CommitBatch) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            for checkpoint in &batch.checkpoints {
                self.append(checkpoint.clone()).await?;
            }
            self.update_visited_list(batch.journey_id, batch.visited.clone())
                .await?;
            if let Some(record) = &batch.divergence {
                self.append_divergence(batch.journey_id, record.clone())
                    .await?;
            }
            if let Some(status) = batch.status {
                self.update_status(batch.journey_id, status).await?;
            }
            Ok(())
        }
    }
}
