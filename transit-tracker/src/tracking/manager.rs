//! The journey state machine.
//!
//! Each location update is classified as online or recovered-from-gap by
//! comparing the clock with the reading taken at the previous accepted
//! update. Online updates are matched against the short lookahead window;
//! recovered ones go through the wide search and, if the traveler turned up
//! off the planned path, through re-planning.
//!
//! The manager never writes to a store. Every mutating call returns the
//! writes it implies as a [`CommitBatch`] for the caller to persist.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::detection::{DetectionConfig, DetectionResult, GapRecovery, StationDetectionEngine};
use crate::domain::{
    Checkpoint, Coordinate, DetectionMethod, DivergenceRecord, InferenceReason, Journey,
    JourneyStatus, LocationSample, Station, StationId,
};
use crate::planner::RoutePlanner;
use crate::recovery::{Resolution, RouteRecoveryManager};
use crate::store::{Clock, CommitBatch, StationStore};

use super::config::TrackingConfig;
use super::error::TrackingError;
use super::events::{TrackingEvent, TrackingOutcome};
use super::state::{JourneyState, TrackingSession};

/// Orchestrates detection and recovery for location updates.
pub struct JourneyStateManager {
    stations: Arc<dyn StationStore>,
    engine: StationDetectionEngine,
    recovery: RouteRecoveryManager,
    config: TrackingConfig,
    clock: Arc<dyn Clock>,
}

impl JourneyStateManager {
    pub fn new(
        stations: Arc<dyn StationStore>,
        planner: RoutePlanner,
        detection: DetectionConfig,
        config: TrackingConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stations,
            engine: StationDetectionEngine::new(detection),
            recovery: RouteRecoveryManager::new(planner),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Open a session for a freshly created journey.
    ///
    /// The returned batch holds checkpoint 1, the source station, and the
    /// clock reading is taken as the first fix for gap detection. A path of
    /// one station means the traveler is already at the destination, and the
    /// journey completes immediately.
    pub fn begin(
        &self,
        journey: Journey,
        planned_path: Vec<Station>,
    ) -> Result<(TrackingSession, CommitBatch), TrackingError> {
        let source = self
            .stations
            .by_id(journey.source)
            .cloned()
            .ok_or(TrackingError::UnknownStation(journey.source))?;
        let started_at = journey.started_at;

        let mut session = TrackingSession::new(journey, planned_path, 1);
        // Starting counts as a reading at the source.
        session.last_gps_at = Some(self.clock.now());
        let checkpoint = new_checkpoint(
            &mut session,
            &source,
            started_at,
            DetectionMethod::Manual,
            1.0,
            Some(source.location),
            None,
        );
        let is_destination = session.planned_path.len() == 1;
        let status = self.finish_if_destination(&mut session, is_destination);

        debug!(
            journey = %session.journey.id,
            source = %source.id,
            stations = session.planned_path.len(),
            "tracking started"
        );
        let batch = batch(&session, vec![checkpoint], None, status);
        Ok((session, batch))
    }

    /// Re-arm a session: back to `Idle` with no detection history.
    pub fn reset_state(&self, session: &mut TrackingSession) {
        session.reset();
        debug!(journey = %session.journey.id, "tracking state reset");
    }

    /// Process one location fix.
    ///
    /// Samples older than the last accepted one are rejected with
    /// [`TrackingError::StaleUpdate`] and change nothing.
    pub fn process_location_update(
        &self,
        session: &mut TrackingSession,
        sample: LocationSample,
    ) -> Result<TrackingOutcome, TrackingError> {
        ensure_tracking(session)?;
        if let Some(last_processed) = session.last_sample_at {
            if sample.recorded_at < last_processed {
                debug!(journey = %session.journey.id, sample_at = %sample.recorded_at, "stale update dropped");
                return Err(TrackingError::StaleUpdate {
                    sample_at: sample.recorded_at,
                    last_processed,
                });
            }
        }

        let now = self.clock.now();
        let gap_since = session
            .last_gps_at
            .filter(|&at| now - at > self.config.gps_timeout());
        let outcome = match gap_since {
            Some(silent_since) => self.recover(session, &sample, now, silent_since)?,
            None => self.detect(session, &sample),
        };

        session.last_gps_at = Some(now);
        session.last_sample_at = Some(sample.recorded_at);
        session.last_location = Some(sample.location);
        Ok(outcome)
    }

    /// Record the traveler's own confirmation of reaching `station`.
    ///
    /// The station must lie at or after the current position on the planned
    /// path. Stations skipped on the way become inferred checkpoints.
    pub fn record_manual_arrival(
        &self,
        session: &mut TrackingSession,
        station: StationId,
    ) -> Result<TrackingOutcome, TrackingError> {
        ensure_tracking(session)?;
        let confirmed = self
            .stations
            .by_id(station)
            .ok_or(TrackingError::UnknownStation(station))?;

        let ahead = session
            .planned_path
            .get(session.current_index..)
            .unwrap_or(&[]);
        let offset = ahead
            .iter()
            .position(|s| s.id == station)
            .or_else(|| ahead.iter().position(|s| s.is_same_place(confirmed)))
            .ok_or(TrackingError::NotOnPlannedPath(station))?;
        let index = session.current_index + offset;
        let arrived = session.planned_path[index].clone();

        if is_current(session, &arrived) {
            return Ok(TrackingOutcome::unchanged(TrackingEvent::SameStation {
                station: arrived.id,
            }));
        }

        let now = self.clock.now();
        let skipped = session
            .planned_path
            .get(session.current_index + 1..index)
            .map(<[Station]>::to_vec)
            .unwrap_or_default();

        let mut checkpoints = Vec::with_capacity(skipped.len() + 1);
        for passed in &skipped {
            checkpoints.push(new_checkpoint(
                session,
                passed,
                now,
                DetectionMethod::Inferred,
                self.config.inferred_confidence,
                None,
                Some(InferenceReason::ManualAdvance),
            ));
            session.journey.record_visit(passed.id);
        }
        checkpoints.push(new_checkpoint(
            session,
            &arrived,
            now,
            DetectionMethod::Manual,
            1.0,
            Some(arrived.location),
            None,
        ));
        session.journey.record_visit(arrived.id);
        session.current_index = index;
        session.last_detected = Some(arrived.id);
        session.set_active();

        let is_destination = index + 1 == session.planned_path.len();
        let status = self.finish_if_destination(session, is_destination);
        debug!(journey = %session.journey.id, station = %arrived.id, skipped = skipped.len(), "manual arrival");

        Ok(TrackingOutcome {
            commit: Some(batch(session, checkpoints, None, status)),
            event: TrackingEvent::ManualArrival {
                station: arrived,
                inferred: skipped.iter().map(|s| s.id).collect(),
                is_destination,
            },
            transitions: Vec::new(),
        })
    }

    /// Online branch: match against the lookahead window.
    fn detect(&self, session: &mut TrackingSession, sample: &LocationSample) -> TrackingOutcome {
        let DetectionResult {
            station,
            path_index,
            confidence,
            checked,
            is_destination,
            ..
        } = self.engine.detect_in_range(
            sample.location,
            &session.planned_path,
            session.current_index,
        );
        let (Some(station), Some(index)) = (station, path_index) else {
            return TrackingOutcome::unchanged(TrackingEvent::NoDetection { checked });
        };
        if is_current(session, &station) {
            return TrackingOutcome::unchanged(TrackingEvent::SameStation {
                station: station.id,
            });
        }

        let checkpoint = new_checkpoint(
            session,
            &station,
            sample.recorded_at,
            DetectionMethod::Gps,
            confidence,
            Some(sample.location),
            None,
        );
        session.journey.record_visit(station.id);
        session.current_index = index;
        session.last_detected = Some(station.id);
        session.set_active();
        let status = self.finish_if_destination(session, is_destination);

        debug!(journey = %session.journey.id, station = %station.id, confidence, is_destination, "station detected");
        TrackingOutcome {
            commit: Some(batch(session, vec![checkpoint], None, status)),
            event: TrackingEvent::NewStationDetected {
                station,
                confidence,
                is_destination,
            },
            transitions: Vec::new(),
        }
    }

    /// Gap branch: wide search, then gap-fill or re-plan.
    fn recover(
        &self,
        session: &mut TrackingSession,
        sample: &LocationSample,
        now: DateTime<Utc>,
        silent_since: DateTime<Utc>,
    ) -> Result<TrackingOutcome, TrackingError> {
        let gap = JourneyState::GpsGap {
            journey_id: session.journey.id,
            silent_since,
        };
        session.state = gap.clone();
        let transitions = vec![gap];
        debug!(
            journey = %session.journey.id,
            silent_secs = (now - silent_since).num_seconds(),
            "gps gap, searching wide"
        );

        let anchor = session
            .planned_path
            .get(session.current_index)
            .map_or(session.journey.last_visited(), |s| s.id);
        let found = self.engine.recover_after_gap(
            sample.location,
            anchor,
            &session.planned_path,
            self.stations.as_ref(),
        );
        let Some(found) = found else {
            session.set_active();
            return Ok(TrackingOutcome {
                event: TrackingEvent::NoDetection {
                    checked: Vec::new(),
                },
                commit: None,
                transitions,
            });
        };

        if is_current(session, &found.station) {
            session.set_active();
            return Ok(TrackingOutcome {
                event: TrackingEvent::SameStation {
                    station: found.station.id,
                },
                commit: None,
                transitions,
            });
        }

        match found.path_index {
            None => self.diverge(session, sample, now, found, transitions),
            Some(index) if index < session.current_index => {
                session.set_active();
                Ok(TrackingOutcome {
                    event: TrackingEvent::NoDetection {
                        checked: vec![found.station.id],
                    },
                    commit: None,
                    transitions,
                })
            }
            Some(index) => Ok(self.rejoin(session, sample, index, found, transitions)),
        }
    }

    /// Back on the planned path at `index`; fill in the stations passed.
    fn rejoin(
        &self,
        session: &mut TrackingSession,
        sample: &LocationSample,
        index: usize,
        found: GapRecovery,
        transitions: Vec<JourneyState>,
    ) -> TrackingOutcome {
        let arrived = session.planned_path[index].clone();
        if is_current(session, &arrived) {
            session.set_active();
            return TrackingOutcome {
                event: TrackingEvent::SameStation {
                    station: arrived.id,
                },
                commit: None,
                transitions,
            };
        }

        let mut checkpoints = Vec::with_capacity(found.inferred.len() + 1);
        for passed in &found.inferred {
            checkpoints.push(new_checkpoint(
                session,
                passed,
                sample.recorded_at,
                DetectionMethod::Hybrid,
                self.config.inferred_confidence,
                None,
                Some(InferenceReason::GpsGap),
            ));
            session.journey.record_visit(passed.id);
        }
        checkpoints.push(new_checkpoint(
            session,
            &arrived,
            sample.recorded_at,
            DetectionMethod::Gps,
            found.confidence,
            Some(sample.location),
            None,
        ));
        session.journey.record_visit(arrived.id);
        session.current_index = index;
        session.last_detected = Some(arrived.id);
        session.set_active();

        let is_destination = index + 1 == session.planned_path.len();
        let status = self.finish_if_destination(session, is_destination);
        info!(
            journey = %session.journey.id,
            station = %arrived.id,
            inferred = found.inferred.len(),
            "gps recovered on path"
        );

        TrackingOutcome {
            commit: Some(batch(session, checkpoints, None, status)),
            event: TrackingEvent::GpsRecoveredOnPath {
                station: arrived,
                confidence: found.confidence,
                inferred: found.inferred.iter().map(|s| s.id).collect(),
                is_destination,
            },
            transitions,
        }
    }

    /// Off the planned path: record the divergence and re-plan.
    fn diverge(
        &self,
        session: &mut TrackingSession,
        sample: &LocationSample,
        now: DateTime<Utc>,
        found: GapRecovery,
        mut transitions: Vec<JourneyState>,
    ) -> Result<TrackingOutcome, TrackingError> {
        let diverged = JourneyState::Diverged {
            journey_id: session.journey.id,
            detected: found.station.id,
        };
        session.state = diverged.clone();
        transitions.push(diverged);

        let last_id = session.journey.last_visited();
        let last_known = self
            .stations
            .by_id(last_id)
            .ok_or(TrackingError::UnknownStation(last_id))?;
        let resolved = self.recovery.handle_route_divergence(
            session.journey.id,
            last_known,
            &found.station,
            session.journey.destination,
            session.journey.preference,
            now,
        );

        let station = found.station;
        let checkpoint = new_checkpoint(
            session,
            &station,
            sample.recorded_at,
            DetectionMethod::Gps,
            found.confidence,
            Some(sample.location),
            None,
        );
        session.journey.record_visit(station.id);
        session.last_detected = Some(station.id);

        let is_destination = match resolved.resolution {
            Resolution::Resolved => {
                session.planned_path = resolved.new_path.clone();
                session.current_index = 0;
                session.planned_path.len() == 1
            }
            Resolution::Unresolved => {
                warn!(
                    journey = %session.journey.id,
                    station = %station.id,
                    "destination unreachable from detected station, keeping previous path"
                );
                false
            }
        };
        session.set_active();
        let status = self.finish_if_destination(session, is_destination);
        info!(
            journey = %session.journey.id,
            last_known = %last_id,
            detected = %station.id,
            resolution = ?resolved.resolution,
            "route divergence"
        );

        let record: DivergenceRecord = resolved.record;
        Ok(TrackingOutcome {
            commit: Some(batch(
                session,
                vec![checkpoint],
                Some(record.clone()),
                status,
            )),
            event: TrackingEvent::GpsRecoveredWithDivergence {
                station,
                confidence: found.confidence,
                new_path: resolved.new_path,
                record,
                resolution: resolved.resolution,
                is_destination,
            },
            transitions,
        })
    }

    fn finish_if_destination(
        &self,
        session: &mut TrackingSession,
        is_destination: bool,
    ) -> Option<JourneyStatus> {
        if !is_destination {
            return None;
        }
        session.close(JourneyStatus::Completed);
        info!(journey = %session.journey.id, "destination reached");
        Some(JourneyStatus::Completed)
    }
}

fn ensure_tracking(session: &TrackingSession) -> Result<(), TrackingError> {
    if !session.journey.is_active() {
        return Err(TrackingError::JourneyNotActive {
            journey: session.journey.id,
            status: session.journey.status,
        });
    }
    if matches!(session.state, JourneyState::Idle) {
        return Err(TrackingError::Idle(session.journey.id));
    }
    Ok(())
}

/// True if `station` is where the traveler already is.
fn is_current(session: &TrackingSession, station: &Station) -> bool {
    session.last_detected == Some(station.id) || session.journey.last_visited() == station.id
}

fn new_checkpoint(
    session: &mut TrackingSession,
    station: &Station,
    reached_at: DateTime<Utc>,
    method: DetectionMethod,
    confidence: f64,
    location: Option<Coordinate>,
    inference_reason: Option<InferenceReason>,
) -> Checkpoint {
    Checkpoint {
        journey_id: session.journey.id,
        sequence: session.take_sequence(),
        station_id: station.id,
        station_name: station.name.clone(),
        reached_at,
        method,
        confidence,
        location,
        inference_reason,
    }
}

fn batch(
    session: &TrackingSession,
    checkpoints: Vec<Checkpoint>,
    divergence: Option<DivergenceRecord>,
    status: Option<JourneyStatus>,
) -> CommitBatch {
    CommitBatch {
        journey_id: session.journey.id,
        checkpoints,
        visited: session.journey.visited().to_vec(),
        divergence,
        status,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::super::fixtures::{clock, fix, ids, long_line, manager, network, planner, t0};
    use super::*;
    use crate::domain::{JourneyId, NewJourney, RoutePreference};
    use crate::network::StationGraph;

    fn journey(source: u32, destination: u32) -> Journey {
        Journey::new(
            JourneyId(1),
            NewJourney {
                source: StationId(source),
                destination: StationId(destination),
                preference: RoutePreference::ShortestPath,
                started_at: t0(),
            },
        )
    }

    fn session(
        m: &JourneyStateManager,
        graph: &StationGraph,
        source: u32,
        destination: u32,
    ) -> TrackingSession {
        let path = planner(graph)
            .find_route(
                StationId(source),
                StationId(destination),
                RoutePreference::ShortestPath,
            )
            .unwrap()
            .into_stations();
        m.begin(journey(source, destination), path).unwrap().0
    }

    fn visited(session: &TrackingSession) -> Vec<u32> {
        session.journey().visited().iter().map(|s| s.get()).collect()
    }

    #[test]
    fn begin_writes_source_checkpoint() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let path = planner(&graph)
            .find_route(StationId(1), StationId(5), RoutePreference::ShortestPath)
            .unwrap()
            .into_stations();

        let (session, batch) = m.begin(journey(1, 5), path).unwrap();
        assert_eq!(batch.checkpoints.len(), 1);
        let cp = &batch.checkpoints[0];
        assert_eq!(cp.sequence, 1);
        assert_eq!(cp.station_id, StationId(1));
        assert_eq!(cp.method, DetectionMethod::Manual);
        assert_eq!(cp.confidence, 1.0);
        assert_eq!(batch.visited, vec![StationId(1)]);
        assert_eq!(batch.status, None);
        assert_eq!(session.next_sequence(), 2);
        assert_eq!(
            ids(session.planned_path()),
            vec![
                StationId(1),
                StationId(2),
                StationId(3),
                StationId(4),
                StationId(5)
            ]
        );
    }

    #[test]
    fn begin_at_destination_completes() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let (session, batch) = m
            .begin(journey(3, 3), vec![graph.get(StationId(3)).unwrap().clone()])
            .unwrap();
        assert_eq!(batch.status, Some(JourneyStatus::Completed));
        assert!(!session.is_tracking());
    }

    #[test]
    fn online_detection_and_dwell() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let mut s = session(&m, &graph, 1, 5);

        // Still at the source
        let out = m.process_location_update(&mut s, fix(&graph, 1, t0())).unwrap();
        assert_eq!(
            out.event,
            TrackingEvent::SameStation {
                station: StationId(1)
            }
        );
        assert!(out.commit.is_none());

        clock.advance(Duration::seconds(10));
        let out = m
            .process_location_update(&mut s, fix(&graph, 2, clock.now()))
            .unwrap();
        match &out.event {
            TrackingEvent::NewStationDetected {
                station,
                confidence,
                is_destination,
            } => {
                assert_eq!(station.id, StationId(2));
                assert_eq!(*confidence, 0.95);
                assert!(!is_destination);
            }
            other => panic!("unexpected event {other:?}"),
        }
        let commit = out.commit.unwrap();
        assert_eq!(commit.checkpoints.len(), 1);
        assert_eq!(commit.checkpoints[0].sequence, 2);
        assert_eq!(commit.checkpoints[0].method, DetectionMethod::Gps);
        assert_eq!(commit.visited, vec![StationId(1), StationId(2)]);

        // Dwelling at B produces nothing new
        clock.advance(Duration::seconds(10));
        let out = m
            .process_location_update(&mut s, fix(&graph, 2, clock.now()))
            .unwrap();
        assert_eq!(
            out.event,
            TrackingEvent::SameStation {
                station: StationId(2)
            }
        );
        assert!(out.commit.is_none());
        assert_eq!(visited(&s), vec![1, 2]);
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.last_gps_at(), Some(clock.now()));
    }

    #[test]
    fn no_detection_between_stations() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let mut s = session(&m, &graph, 1, 5);

        let between = LocationSample::new(Coordinate::new(28.005, 77.0).unwrap(), t0());
        let out = m.process_location_update(&mut s, between).unwrap();
        assert!(matches!(out.event, TrackingEvent::NoDetection { .. }));
        // Timestamps still advance so the next call classifies correctly
        assert_eq!(s.last_gps_at(), Some(t0()));
        assert_eq!(s.last_location(), Some(between.location));
    }

    #[test]
    fn gap_fill_on_path() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let mut s = session(&m, &graph, 1, 5);

        clock.advance(Duration::seconds(10));
        m.process_location_update(&mut s, fix(&graph, 2, clock.now()))
            .unwrap();

        clock.advance(Duration::seconds(90));
        let out = m
            .process_location_update(&mut s, fix(&graph, 4, clock.now()))
            .unwrap();

        match &out.event {
            TrackingEvent::GpsRecoveredOnPath {
                station,
                inferred,
                is_destination,
                ..
            } => {
                assert_eq!(station.id, StationId(4));
                assert_eq!(inferred, &vec![StationId(3)]);
                assert!(!is_destination);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(out.transitions[..], [JourneyState::GpsGap { .. }]));

        let commit = out.commit.unwrap();
        assert_eq!(commit.checkpoints.len(), 2);
        let (c, d) = (&commit.checkpoints[0], &commit.checkpoints[1]);
        assert_eq!(c.station_id, StationId(3));
        assert_eq!(c.sequence, 3);
        assert_eq!(c.method, DetectionMethod::Hybrid);
        assert_eq!(c.confidence, 0.7);
        assert_eq!(c.inference_reason, Some(InferenceReason::GpsGap));
        assert!(c.is_inferred());
        assert_eq!(d.station_id, StationId(4));
        assert_eq!(d.sequence, 4);
        assert_eq!(d.method, DetectionMethod::Gps);
        assert!(!d.is_inferred());

        assert_eq!(visited(&s), vec![1, 2, 3, 4]);
        assert_eq!(
            s.state(),
            &JourneyState::Active {
                journey_id: JourneyId(1),
                current_index: 3
            }
        );
    }

    #[test]
    fn late_first_fix_is_a_gap() {
        let graph = long_line();
        let clock = clock();
        let m = manager(&graph, &clock);
        let mut s = session(&m, &graph, 51, 58);
        assert_eq!(s.last_gps_at(), Some(t0()));

        // Six stations along, well beyond the lookahead window.
        clock.advance(Duration::seconds(600));
        let out = m
            .process_location_update(&mut s, fix(&graph, 56, clock.now()))
            .unwrap();
        match &out.event {
            TrackingEvent::GpsRecoveredOnPath {
                station, inferred, ..
            } => {
                assert_eq!(station.id, StationId(56));
                assert_eq!(
                    inferred,
                    &vec![StationId(52), StationId(53), StationId(54), StationId(55)]
                );
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(out.transitions[..], [JourneyState::GpsGap { .. }]));

        clock.advance(Duration::seconds(10));
        let out = m
            .process_location_update(&mut s, fix(&graph, 57, clock.now()))
            .unwrap();
        assert!(matches!(out.event, TrackingEvent::NewStationDetected { .. }));
        assert_eq!(visited(&s), (51..=57).collect::<Vec<_>>());
    }

    #[test]
    fn exactly_timeout_is_not_a_gap() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let mut s = session(&m, &graph, 1, 5);

        m.process_location_update(&mut s, fix(&graph, 1, t0()))
            .unwrap();
        clock.advance(Duration::seconds(30));
        let out = m
            .process_location_update(&mut s, fix(&graph, 2, clock.now()))
            .unwrap();
        assert!(matches!(out.event, TrackingEvent::NewStationDetected { .. }));
        assert!(out.transitions.is_empty());
    }

    #[test]
    fn divergence_replans_and_completes() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let mut s = session(&m, &graph, 1, 5);

        m.process_location_update(&mut s, fix(&graph, 1, t0()))
            .unwrap();
        clock.advance(Duration::seconds(120));
        let out = m
            .process_location_update(&mut s, fix(&graph, 11, clock.now()))
            .unwrap();

        match &out.event {
            TrackingEvent::GpsRecoveredWithDivergence {
                station,
                new_path,
                record,
                resolution,
                is_destination,
                ..
            } => {
                assert_eq!(station.id, StationId(11));
                assert_eq!(
                    ids(new_path),
                    vec![StationId(11), StationId(12), StationId(13)]
                );
                assert_eq!(record.last_known, StationId(1));
                assert_eq!(record.detected, StationId(11));
                assert_eq!(record.inferred_bridge, vec![StationId(2)]);
                assert_eq!(record.recorded_at, clock.now());
                assert_eq!(*resolution, Resolution::Resolved);
                assert!(!is_destination);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(
            out.transitions[..],
            [JourneyState::GpsGap { .. }, JourneyState::Diverged { .. }]
        ));
        let commit = out.commit.unwrap();
        assert!(commit.divergence.is_some());
        assert_eq!(commit.checkpoints.len(), 1);
        assert_eq!(commit.visited, vec![StationId(1), StationId(11)]);

        // Following the new path online
        assert_eq!(s.current_index(), 0);
        clock.advance(Duration::seconds(10));
        let out = m
            .process_location_update(&mut s, fix(&graph, 12, clock.now()))
            .unwrap();
        assert!(matches!(out.event, TrackingEvent::NewStationDetected { .. }));

        clock.advance(Duration::seconds(10));
        let out = m
            .process_location_update(&mut s, fix(&graph, 13, clock.now()))
            .unwrap();
        assert!(out.event.reached_destination());
        assert_eq!(
            out.commit.unwrap().status,
            Some(JourneyStatus::Completed)
        );
        assert_eq!(
            s.state(),
            &JourneyState::Completed {
                journey_id: JourneyId(1)
            }
        );

        clock.advance(Duration::seconds(10));
        let err = m
            .process_location_update(&mut s, fix(&graph, 13, clock.now()))
            .unwrap_err();
        assert_eq!(
            err,
            TrackingError::JourneyNotActive {
                journey: JourneyId(1),
                status: JourneyStatus::Completed
            }
        );
    }

    #[test]
    fn unresolved_divergence_keeps_path() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let mut s = session(&m, &graph, 1, 5);
        let original = s.planned_path().to_vec();

        m.process_location_update(&mut s, fix(&graph, 1, t0()))
            .unwrap();
        clock.advance(Duration::seconds(120));
        let out = m
            .process_location_update(&mut s, fix(&graph, 30, clock.now()))
            .unwrap();

        match &out.event {
            TrackingEvent::GpsRecoveredWithDivergence {
                new_path,
                resolution,
                ..
            } => {
                assert!(new_path.is_empty());
                assert_eq!(*resolution, Resolution::Unresolved);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(s.planned_path(), &original[..]);
        assert_eq!(s.current_index(), 0);
        assert!(s.is_tracking());
        assert_eq!(visited(&s), vec![1, 30]);

        // Tracking carries on along the frozen path
        clock.advance(Duration::seconds(10));
        let out = m
            .process_location_update(&mut s, fix(&graph, 2, clock.now()))
            .unwrap();
        assert!(matches!(out.event, TrackingEvent::NewStationDetected { .. }));
        assert_eq!(visited(&s), vec![1, 30, 2]);
    }

    #[test]
    fn recovery_at_current_station_is_same_station() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let mut s = session(&m, &graph, 1, 5);

        m.process_location_update(&mut s, fix(&graph, 1, t0()))
            .unwrap();
        clock.advance(Duration::seconds(120));
        let out = m
            .process_location_update(&mut s, fix(&graph, 1, clock.now()))
            .unwrap();
        assert_eq!(
            out.event,
            TrackingEvent::SameStation {
                station: StationId(1)
            }
        );
        assert!(out.commit.is_none());
    }

    #[test]
    fn recovery_behind_is_no_detection() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let mut s = session(&m, &graph, 1, 5);

        m.record_manual_arrival(&mut s, StationId(4)).unwrap();
        m.process_location_update(&mut s, fix(&graph, 4, t0()))
            .unwrap();
        clock.advance(Duration::seconds(120));
        let out = m
            .process_location_update(&mut s, fix(&graph, 2, clock.now()))
            .unwrap();
        assert!(matches!(out.event, TrackingEvent::NoDetection { .. }));
        assert_eq!(visited(&s), vec![1, 2, 3, 4]);
    }

    #[test]
    fn stale_sample_rejected_without_change() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let mut s = session(&m, &graph, 1, 5);

        let later = t0() + Duration::seconds(100);
        m.process_location_update(&mut s, fix(&graph, 1, later))
            .unwrap();
        let before = s.clone();

        let err = m
            .process_location_update(&mut s, fix(&graph, 2, t0()))
            .unwrap_err();
        assert_eq!(
            err,
            TrackingError::StaleUpdate {
                sample_at: t0(),
                last_processed: later
            }
        );
        assert_eq!(visited(&s), visited(&before));
        assert_eq!(s.last_gps_at(), before.last_gps_at());
    }

    #[test]
    fn manual_arrival_infers_skipped_stations() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let mut s = session(&m, &graph, 1, 5);

        let out = m.record_manual_arrival(&mut s, StationId(4)).unwrap();
        match &out.event {
            TrackingEvent::ManualArrival {
                station, inferred, ..
            } => {
                assert_eq!(station.id, StationId(4));
                assert_eq!(inferred, &vec![StationId(2), StationId(3)]);
            }
            other => panic!("unexpected event {other:?}"),
        }
        let commit = out.commit.unwrap();
        let methods: Vec<_> = commit.checkpoints.iter().map(|c| c.method).collect();
        assert_eq!(
            methods,
            vec![
                DetectionMethod::Inferred,
                DetectionMethod::Inferred,
                DetectionMethod::Manual
            ]
        );
        assert_eq!(
            commit.checkpoints[0].inference_reason,
            Some(InferenceReason::ManualAdvance)
        );
        assert_eq!(commit.checkpoints[2].confidence, 1.0);
        assert_eq!(commit.checkpoints[2].sequence, 4);
        assert_eq!(visited(&s), vec![1, 2, 3, 4]);

        // Behind, unknown, and repeated confirmations
        assert_eq!(
            m.record_manual_arrival(&mut s, StationId(2)).unwrap_err(),
            TrackingError::NotOnPlannedPath(StationId(2))
        );
        assert_eq!(
            m.record_manual_arrival(&mut s, StationId(99)).unwrap_err(),
            TrackingError::UnknownStation(StationId(99))
        );
        let out = m.record_manual_arrival(&mut s, StationId(4)).unwrap();
        assert!(out.commit.is_none());

        // Interchange twin of the destination counts
        let out = m.record_manual_arrival(&mut s, StationId(13)).unwrap();
        assert!(out.event.reached_destination());
        assert!(!s.is_tracking());
    }

    #[test]
    fn reset_state_stops_tracking() {
        let graph = network();
        let clock = clock();
        let m = manager(&graph, &clock);
        let mut s = session(&m, &graph, 1, 5);

        m.reset_state(&mut s);
        assert_eq!(s.state(), &JourneyState::Idle);
        assert_eq!(
            m.process_location_update(&mut s, fix(&graph, 2, t0()))
                .unwrap_err(),
            TrackingError::Idle(JourneyId(1))
        );
    }
}
