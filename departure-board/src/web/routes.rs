//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::board::BoardError;
use crate::domain::{StopId, TripId};
use crate::feed::RowSource;

use super::dto::*;
use super::state::AppState;

/// Seconds clients are asked to wait before retrying a timed-out scan.
const RETRY_AFTER_SECS: u64 = 30;

/// Create the application router.
pub fn create_router<S: RowSource + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stops/search", get(search_stops::<S>))
        .route("/api/stops/:stop_id/departures", get(stop_departures::<S>))
        .route("/api/stops/:stop_id/cache", delete(invalidate_stop_cache::<S>))
        .route("/api/trips/:trip_id/route", get(trip_route::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Search stops by name.
async fn search_stops<S: RowSource + 'static>(
    State(state): State<AppState<S>>,
    Query(req): Query<StopSearchRequest>,
) -> Json<StopSearchResponse> {
    let config = state.board.config();
    let limit = config.clamp_limit(req.limit, config.default_results_limit);

    let stops = state
        .board
        .search_stops(&req.q, limit)
        .into_iter()
        .map(StopSearchResult::from)
        .collect();

    Json(StopSearchResponse { stops })
}

/// Next departures at a stop, optionally merged with its child platforms.
async fn stop_departures<S: RowSource + 'static>(
    State(state): State<AppState<S>>,
    Path(stop_id): Path<String>,
    Query(req): Query<DeparturesRequest>,
) -> Result<Json<DeparturesResponse>, AppError> {
    let stop = parse_stop(&stop_id)?;
    let config = state.board.config();
    let limit = config.clamp_limit(req.limit, config.default_departures_limit);

    let next = if req.include_children {
        state.board.station_departures(&stop, limit).await?
    } else {
        state.board.next_departures(&stop, limit).await?
    };

    let stop_name = state.board.stops().get(stop.as_str()).map(|s| s.name.clone());
    Ok(Json(DeparturesResponse::from_next(next, stop_name)))
}

/// The ordered stops of a trip with coordinates.
async fn trip_route<S: RowSource + 'static>(
    State(state): State<AppState<S>>,
    Path(trip_id): Path<String>,
) -> Result<Json<TripRouteResponse>, AppError> {
    let trip = TripId::new(&trip_id).map_err(|_| AppError::BadRequest {
        message: format!("Invalid trip id: {trip_id:?}"),
    })?;

    let route = state.board.trip_route(&trip).await?;
    Ok(Json(TripRouteResponse::from(route)))
}

/// Drop a stop's cached departures so the next query rescans the feed.
async fn invalidate_stop_cache<S: RowSource + 'static>(
    State(state): State<AppState<S>>,
    Path(stop_id): Path<String>,
) -> Result<Json<InvalidateResponse>, AppError> {
    let stop = parse_stop(&stop_id)?;
    if !state.board.stops().contains(stop.as_str()) {
        return Err(BoardError::UnknownStop(stop).into());
    }

    let was_cached = state.board.invalidate_stop(&stop).await?;
    Ok(Json(InvalidateResponse {
        stop_id: stop.into_inner(),
        was_cached,
    }))
}

fn parse_stop(stop_id: &str) -> Result<StopId, AppError> {
    StopId::new(stop_id).map_err(|_| AppError::BadRequest {
        message: format!("Invalid stop id: {stop_id:?}"),
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Unavailable { message: String },
    Internal { message: String },
}

impl From<BoardError> for AppError {
    fn from(e: BoardError) -> Self {
        if e.is_retryable() {
            return AppError::Unavailable {
                message: e.to_string(),
            };
        }
        match e {
            BoardError::UnknownStop(_) | BoardError::UnknownTrip(_) => AppError::NotFound {
                message: e.to_string(),
            },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let mut response = (status, Json(ErrorResponse { error: message })).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
        }
        response
    }
}
