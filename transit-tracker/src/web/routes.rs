//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::domain::{Coordinate, JourneyId, JourneyStatus, LocationSample};
use crate::planner::PlanError;
use crate::store::StoreError;
use crate::tracking::{JourneySnapshot, TrackingError, TrackingEvent};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stations", get(list_stations))
        .route("/api/route", post(plan_route))
        .route("/api/journeys", post(start_journey))
        .route("/api/journeys/:id", get(get_journey))
        .route("/api/journeys/:id/location", post(submit_location))
        .route("/api/journeys/:id/manual", post(manual_arrival))
        .route("/api/journeys/:id/cancel", post(cancel_journey))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// All stations in the network.
async fn list_stations(State(state): State<AppState>) -> Json<StationsResponse> {
    let stations = state
        .graph
        .stations()
        .iter()
        .map(StationResult::from_station)
        .collect();
    Json(StationsResponse { stations })
}

/// Plan a route without starting a journey.
async fn plan_route(
    State(state): State<AppState>,
    Json(req): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, AppError> {
    let route = state
        .planner
        .find_route(req.source, req.destination, req.preference)
        .await?;
    Ok(Json(RouteResponse::from_route(&route)))
}

/// Plan a route and start tracking a journey along it.
async fn start_journey(
    State(state): State<AppState>,
    Json(req): Json<RouteRequest>,
) -> Result<(StatusCode, Json<JourneySnapshot>), AppError> {
    let journey = state
        .tracker
        .start_journey(req.source, req.destination, req.preference)
        .await?;
    let snapshot = state.tracker.snapshot(journey.id).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn get_journey(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<JourneySnapshot>, AppError> {
    Ok(Json(state.tracker.snapshot(JourneyId(id)).await?))
}

/// Feed one location fix into a journey.
async fn submit_location(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<LocationRequest>,
) -> Result<Json<TrackingEvent>, AppError> {
    let location = Coordinate::new(req.lat, req.lon).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    let recorded_at = req
        .timestamp
        .unwrap_or_else(|| state.tracker.manager().clock().now());
    let sample = LocationSample::new(location, recorded_at);

    let event = state.tracker.submit(JourneyId(id), sample).await?;
    Ok(Json(event))
}

/// Traveler confirms reaching a station.
async fn manual_arrival(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<ManualArrivalRequest>,
) -> Result<Json<TrackingEvent>, AppError> {
    let event = state
        .tracker
        .record_manual(JourneyId(id), req.station)
        .await?;
    Ok(Json(event))
}

async fn cancel_journey(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<JourneySnapshot>, AppError> {
    let id = JourneyId(id);
    state
        .tracker
        .end_journey(id, JourneyStatus::Cancelled)
        .await?;
    Ok(Json(state.tracker.snapshot(id).await?))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    Unprocessable { message: String },
    Internal { message: String },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        let message = e.to_string();
        match e {
            PlanError::UnknownStation(_) => AppError::BadRequest { message },
            PlanError::NoRouteFound { .. } => AppError::Unprocessable { message },
            PlanError::InvalidRoute(_) => AppError::Internal { message },
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        let message = e.to_string();
        match e {
            StoreError::JourneyNotFound(_) => AppError::NotFound { message },
            StoreError::SequenceGap { .. }
            | StoreError::ConflictingCheckpoint { .. }
            | StoreError::JourneyMismatch { .. } => AppError::Internal { message },
        }
    }
}

impl From<TrackingError> for AppError {
    fn from(e: TrackingError) -> Self {
        let message = e.to_string();
        match e {
            TrackingError::Plan(e) => e.into(),
            TrackingError::Store(e) => e.into(),
            TrackingError::JourneyNotFound(_) => AppError::NotFound { message },
            TrackingError::UnknownStation(_) | TrackingError::NotOnPlannedPath(_) => {
                AppError::BadRequest { message }
            }
            TrackingError::StaleUpdate { .. }
            | TrackingError::JourneyNotActive { .. }
            | TrackingError::Idle(_) => AppError::Conflict { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::Unprocessable { message } => (StatusCode::UNPROCESSABLE_ENTITY, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration};

    use super::*;
    use crate::config::AppConfig;
    use crate::domain::{RoutePreference, StationId};
    use crate::network::NetworkSnapshot;
    use crate::store::ManualClock;

    /// Red A-B-C-D, blue C-Y, 1.1 km apart.
    const NETWORK: &str = r##"{
        "stations": [
            {"id": 1, "name": "A", "line": "red", "line_color": "#e11", "sequence": 1,
             "location": {"lat": 28.00, "lon": 77.0}},
            {"id": 2, "name": "B", "line": "red", "line_color": "#e11", "sequence": 2,
             "location": {"lat": 28.01, "lon": 77.0}},
            {"id": 3, "name": "C", "line": "red", "line_color": "#e11", "sequence": 3,
             "location": {"lat": 28.02, "lon": 77.0}},
            {"id": 4, "name": "D", "line": "red", "line_color": "#e11", "sequence": 4,
             "location": {"lat": 28.03, "lon": 77.0}},
            {"id": 10, "name": "C", "line": "blue", "line_color": "#11e", "sequence": 1,
             "location": {"lat": 28.02, "lon": 77.0001}},
            {"id": 11, "name": "Y", "line": "blue", "line_color": "#11e", "sequence": 2,
             "location": {"lat": 28.02, "lon": 77.01}},
            {"id": 20, "name": "Q", "line": "green", "line_color": "#1e1", "sequence": 1,
             "location": {"lat": 29.0, "lon": 78.0}}
        ]
    }"##;

    fn start() -> DateTime<chrono::Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn state() -> (AppState, Arc<ManualClock>) {
        let graph = NetworkSnapshot::from_json(NETWORK)
            .unwrap()
            .into_graph()
            .unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        (
            AppState::new(graph, &AppConfig::default(), clock.clone()),
            clock,
        )
    }

    fn route_req(source: u32, destination: u32) -> RouteRequest {
        RouteRequest {
            source: StationId(source),
            destination: StationId(destination),
            preference: RoutePreference::ShortestPath,
        }
    }

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[tokio::test]
    async fn health_check() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn stations_listed() {
        let (state, _) = state();
        let Json(resp) = list_stations(State(state)).await;
        assert_eq!(resp.stations.len(), 7);
        let c = resp.stations.iter().find(|s| s.id == StationId(3)).unwrap();
        assert!(c.is_interchange);
        assert_eq!(c.line, "red");
    }

    #[tokio::test]
    async fn route_with_interchange() {
        let (state, _) = state();
        let Json(resp) = plan_route(State(state), Json(route_req(1, 11)))
            .await
            .unwrap();

        let ids: Vec<u32> = resp.stations.iter().map(|s| s.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 11]);
        assert_eq!(resp.segments.len(), 2);
        assert_eq!(resp.segments[1].line, "blue");
        assert_eq!(resp.interchanges, 1);
        assert_eq!(resp.estimated_minutes, 4 * 2 + 5);
    }

    #[tokio::test]
    async fn route_errors_map_to_status() {
        let (state, _) = state();
        let err = plan_route(State(state.clone()), Json(route_req(1, 20)))
            .await
            .unwrap_err();
        assert_eq!(status_of(err), StatusCode::UNPROCESSABLE_ENTITY);

        let err = plan_route(State(state), Json(route_req(1, 99)))
            .await
            .unwrap_err();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn journey_lifecycle() {
        let (state, clock) = state();
        let (status, Json(created)) = start_journey(State(state.clone()), Json(route_req(1, 4)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.checkpoints.len(), 1);
        let id = created.journey.id.0;

        clock.advance(Duration::seconds(10));
        let Json(event) = submit_location(
            State(state.clone()),
            Path(id),
            Json(LocationRequest {
                lat: 28.01,
                lon: 77.0,
                timestamp: None,
            }),
        )
        .await
        .unwrap();
        assert!(matches!(event, TrackingEvent::NewStationDetected { .. }));

        let Json(event) = manual_arrival(
            State(state.clone()),
            Path(id),
            Json(ManualArrivalRequest {
                station: StationId(4),
            }),
        )
        .await
        .unwrap();
        assert!(event.reached_destination());

        let Json(snapshot) = get_journey(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(snapshot.journey.status, JourneyStatus::Completed);
        assert_eq!(snapshot.checkpoints.len(), 4);

        let err = cancel_journey(State(state), Path(id)).await.unwrap_err();
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn bad_location_and_unknown_journey() {
        let (state, _) = state();
        let err = submit_location(
            State(state.clone()),
            Path(1),
            Json(LocationRequest {
                lat: 123.0,
                lon: 0.0,
                timestamp: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);

        let err = get_journey(State(state), Path(77)).await.unwrap_err();
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stale_update_conflicts() {
        let (state, _) = state();
        let (_, Json(created)) = start_journey(State(state.clone()), Json(route_req(1, 4)))
            .await
            .unwrap();
        let id = created.journey.id.0;
        let fix = |secs: i64| LocationRequest {
            lat: 28.0,
            lon: 77.0,
            timestamp: Some(start() + Duration::seconds(secs)),
        };

        let Json(event) = submit_location(State(state.clone()), Path(id), Json(fix(20)))
            .await
            .unwrap();
        assert_eq!(
            event,
            TrackingEvent::SameStation {
                station: StationId(1)
            }
        );
        let err = submit_location(State(state), Path(id), Json(fix(10)))
            .await
            .unwrap_err();
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn router_builds() {
        let (state, _) = state();
        // axum rejects malformed paths when routes are added.
        let _router = create_router(state);
    }
}
