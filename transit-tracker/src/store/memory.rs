//! In-memory journey and checkpoint store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{
    Checkpoint, DivergenceRecord, Journey, JourneyId, JourneyStatus, NewJourney, StationId,
};

use super::{CheckpointStore, CommitBatch, JourneyStore, StoreError, TrackingStore};

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    journeys: HashMap<JourneyId, Journey>,
    checkpoints: HashMap<JourneyId, Vec<Checkpoint>>,
    divergences: HashMap<JourneyId, Vec<DivergenceRecord>>,
}

impl Inner {
    fn journey_mut(&mut self, id: JourneyId) -> Result<&mut Journey, StoreError> {
        self.journeys
            .get_mut(&id)
            .ok_or(StoreError::JourneyNotFound(id))
    }

    /// Check that `batch` can be appended after the stored checkpoints.
    ///
    /// Returns how many leading checkpoints are already stored (retries).
    fn validate_checkpoints(
        &self,
        journey: JourneyId,
        batch: &[Checkpoint],
    ) -> Result<usize, StoreError> {
        if !self.journeys.contains_key(&journey) {
            return Err(StoreError::JourneyNotFound(journey));
        }
        let stored = self.checkpoints.get(&journey).map_or(&[][..], Vec::as_slice);
        let mut expected = stored.len() as u64 + 1;
        let mut already_stored = 0;

        for checkpoint in batch {
            if checkpoint.journey_id != journey {
                return Err(StoreError::JourneyMismatch {
                    expected: journey,
                    got: checkpoint.journey_id,
                });
            }
            if checkpoint.sequence < expected {
                let existing = checkpoint
                    .sequence
                    .checked_sub(1)
                    .and_then(|idx| stored.get(idx as usize));
                if existing != Some(checkpoint) {
                    return Err(StoreError::ConflictingCheckpoint {
                        journey,
                        sequence: checkpoint.sequence,
                    });
                }
                already_stored += 1;
            } else if checkpoint.sequence == expected {
                expected += 1;
            } else {
                return Err(StoreError::SequenceGap {
                    journey,
                    expected,
                    got: checkpoint.sequence,
                });
            }
        }
        Ok(already_stored)
    }

    fn push_checkpoints(&mut self, journey: JourneyId, batch: &[Checkpoint], skip: usize) {
        self.checkpoints
            .entry(journey)
            .or_default()
            .extend(batch.iter().skip(skip).cloned());
    }

    fn push_divergence(&mut self, journey: JourneyId, record: &DivergenceRecord) {
        let records = self.divergences.entry(journey).or_default();
        if records.last() != Some(record) {
            records.push(record.clone());
        }
    }
}

/// Journey and checkpoint store held in process memory.
///
/// Cloning is cheap and clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of journeys ever created.
    pub async fn journey_count(&self) -> usize {
        self.inner.read().await.journeys.len()
    }
}

impl CheckpointStore for MemoryStore {
    async fn append(&self, checkpoint: Checkpoint) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let journey = checkpoint.journey_id;
        let batch = [checkpoint];
        let skip = guard.validate_checkpoints(journey, &batch)?;
        guard.push_checkpoints(journey, &batch, skip);
        Ok(())
    }

    async fn last_checkpoint(&self, journey: JourneyId) -> Result<Option<Checkpoint>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .checkpoints
            .get(&journey)
            .and_then(|list| list.last().cloned()))
    }

    async fn checkpoints_for(&self, journey: JourneyId) -> Result<Vec<Checkpoint>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.checkpoints.get(&journey).cloned().unwrap_or_default())
    }
}

impl JourneyStore for MemoryStore {
    async fn create(&self, new: NewJourney) -> Result<Journey, StoreError> {
        let mut guard = self.inner.write().await;
        guard.next_id += 1;
        let id = JourneyId(guard.next_id);
        let journey = Journey::new(id, new);
        guard.journeys.insert(id, journey.clone());
        Ok(journey)
    }

    async fn by_id(&self, id: JourneyId) -> Result<Option<Journey>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.journeys.get(&id).cloned())
    }

    async fn update_visited_list(
        &self,
        id: JourneyId,
        visited: Vec<StationId>,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let journey = guard.journey_mut(id)?;
        *journey = journey.clone().with_visited(visited);
        Ok(())
    }

    async fn update_status(&self, id: JourneyId, status: JourneyStatus) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard.journey_mut(id)?.status = status;
        Ok(())
    }

    async fn append_divergence(
        &self,
        id: JourneyId,
        record: DivergenceRecord,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard.journey_mut(id)?;
        guard.push_divergence(id, &record);
        Ok(())
    }

    async fn divergences_for(&self, id: JourneyId) -> Result<Vec<DivergenceRecord>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.divergences.get(&id).cloned().unwrap_or_default())
    }
}

impl TrackingStore for MemoryStore {
    /// Validates the whole batch, then applies it under one write lock.
    async fn commit(&self, batch: &CommitBatch) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let id = batch.journey_id;
        let skip = guard.validate_checkpoints(id, &batch.checkpoints)?;

        guard.push_checkpoints(id, &batch.checkpoints, skip);
        let journey = guard.journey_mut(id)?;
        *journey = journey.clone().with_visited(batch.visited.clone());
        if let Some(status) = batch.status {
            journey.status = status;
        }
        if let Some(record) = &batch.divergence {
            guard.push_divergence(id, record);
        }
        Ok(())
    }
}
