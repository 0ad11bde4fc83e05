//! Multi-journey tracking service.
//!
//! Updates for one journey run strictly one at a time through that
//! journey's lane; different journeys proceed in parallel. Each update is
//! processed against a copy of the session, and the copy replaces the live
//! session only once its writes are persisted, so a failed commit leaves
//! both the store and the session as they were.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::domain::{
    Checkpoint, DivergenceRecord, Journey, JourneyId, JourneyStatus, LocationSample, NewJourney,
    RoutePreference, Station, StationId,
};
use crate::planner::CachedRoutePlanner;
use crate::store::TrackingStore;

use super::error::TrackingError;
use super::events::TrackingEvent;
use super::manager::JourneyStateManager;
use super::state::{JourneyState, TrackingSession};

type Lane = Arc<Mutex<TrackingSession>>;

/// Everything known about a journey.
#[derive(Debug, Clone, Serialize)]
pub struct JourneySnapshot {
    pub journey: Journey,
    pub state: JourneyState,
    pub planned_path: Vec<Station>,
    pub current_index: usize,
    pub checkpoints: Vec<Checkpoint>,
    pub divergences: Vec<DivergenceRecord>,
}

/// Tracks many journeys, persisting through a [`TrackingStore`].
pub struct JourneyTracker<S> {
    store: S,
    planner: Arc<CachedRoutePlanner>,
    manager: JourneyStateManager,
    lanes: RwLock<HashMap<JourneyId, Lane>>,
}

impl<S: TrackingStore> JourneyTracker<S> {
    pub fn new(store: S, planner: Arc<CachedRoutePlanner>, manager: JourneyStateManager) -> Self {
        Self {
            store,
            planner,
            manager,
            lanes: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn manager(&self) -> &JourneyStateManager {
        &self.manager
    }

    /// Plan a route and start tracking a new journey along it.
    ///
    /// Fails with [`TrackingError::Plan`] if no route exists; no journey is
    /// created in that case.
    pub async fn start_journey(
        &self,
        source: StationId,
        destination: StationId,
        preference: RoutePreference,
    ) -> Result<Journey, TrackingError> {
        let route = self
            .planner
            .find_route(source, destination, preference)
            .await?;

        let journey = self
            .store
            .create(NewJourney {
                source,
                destination,
                preference,
                started_at: self.manager.clock().now(),
            })
            .await?;
        let id = journey.id;
        let (session, batch) = self.manager.begin(journey, route.stations().to_vec())?;
        self.store.commit(&batch).await?;

        let journey = session.journey().clone();
        self.lanes
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        info!(
            journey = %id,
            %source,
            %destination,
            ?preference,
            stations = route.len(),
            "journey started"
        );
        Ok(journey)
    }

    /// Process one location fix for a journey.
    pub async fn submit(
        &self,
        id: JourneyId,
        sample: LocationSample,
    ) -> Result<TrackingEvent, TrackingError> {
        let lane = self.lane(id).await?;
        let mut live = lane.lock().await;

        let mut next = live.clone();
        let outcome = self.manager.process_location_update(&mut next, sample)?;
        if let Some(batch) = &outcome.commit {
            self.store.commit(batch).await?;
        }
        *live = next;
        Ok(outcome.event)
    }

    /// Process fixes for several journeys.
    ///
    /// Journeys run concurrently; fixes for the same journey are applied in
    /// the order given. Results come back in input order.
    pub async fn submit_many(
        &self,
        updates: Vec<(JourneyId, LocationSample)>,
    ) -> Vec<Result<TrackingEvent, TrackingError>> {
        let total = updates.len();
        let mut per_journey: HashMap<JourneyId, Vec<(usize, LocationSample)>> = HashMap::new();
        for (pos, (id, sample)) in updates.into_iter().enumerate() {
            per_journey.entry(id).or_default().push((pos, sample));
        }

        let lanes = per_journey.into_iter().map(|(id, samples)| async move {
            let mut results = Vec::with_capacity(samples.len());
            for (pos, sample) in samples {
                results.push((pos, self.submit(id, sample).await));
            }
            results
        });

        let mut ordered: Vec<(usize, Result<TrackingEvent, TrackingError>)> =
            Vec::with_capacity(total);
        for results in join_all(lanes).await {
            ordered.extend(results);
        }
        ordered.sort_by_key(|(pos, _)| *pos);
        debug!(updates = total, "batch processed");
        ordered.into_iter().map(|(_, result)| result).collect()
    }

    /// Record a manual arrival for a journey.
    pub async fn record_manual(
        &self,
        id: JourneyId,
        station: StationId,
    ) -> Result<TrackingEvent, TrackingError> {
        let lane = self.lane(id).await?;
        let mut live = lane.lock().await;

        let mut next = live.clone();
        let outcome = self.manager.record_manual_arrival(&mut next, station)?;
        if let Some(batch) = &outcome.commit {
            self.store.commit(batch).await?;
        }
        *live = next;
        Ok(outcome.event)
    }

    /// End a journey with a terminal status.
    pub async fn end_journey(
        &self,
        id: JourneyId,
        status: JourneyStatus,
    ) -> Result<Journey, TrackingError> {
        let lane = self.lane(id).await?;
        let mut live = lane.lock().await;
        if !live.journey().is_active() {
            return Err(TrackingError::JourneyNotActive {
                journey: id,
                status: live.journey().status,
            });
        }

        self.store.update_status(id, status).await?;
        live.close(status);
        info!(journey = %id, %status, "journey ended");
        Ok(live.journey().clone())
    }

    /// Current view of a journey: stored records plus live tracking state.
    pub async fn snapshot(&self, id: JourneyId) -> Result<JourneySnapshot, TrackingError> {
        let lane = self.lane(id).await?;
        let live = lane.lock().await;

        let journey = self
            .store
            .by_id(id)
            .await?
            .ok_or(TrackingError::JourneyNotFound(id))?;
        Ok(JourneySnapshot {
            journey,
            state: live.state().clone(),
            planned_path: live.planned_path().to_vec(),
            current_index: live.current_index(),
            checkpoints: self.store.checkpoints_for(id).await?,
            divergences: self.store.divergences_for(id).await?,
        })
    }

    /// Number of journeys with a lane, active or not.
    pub async fn journey_count(&self) -> usize {
        self.lanes.read().await.len()
    }

    async fn lane(&self, id: JourneyId) -> Result<Lane, TrackingError> {
        self.lanes
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(TrackingError::JourneyNotFound(id))
    }
}
