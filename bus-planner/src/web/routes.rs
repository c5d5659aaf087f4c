//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::warn;

use crate::domain::DomainError;
use crate::engine::EngineError;
use crate::stops::NearbyResult;

use super::dto::*;
use super::state::AppState;

/// Header carrying the client session used for supersession.
pub const SESSION_HEADER: &str = "x-session-id";

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/feed/status", get(feed_status))
        .route("/itineraries/plan", post(plan_itineraries))
        .route("/stops/nearby", get(nearby_stops))
        .route("/calendar/day", get(calendar_day))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn feed_status(State(state): State<AppState>) -> Json<FeedStatusResponse> {
    let status = state.engine.current().await.ok().map(|engine| engine.status());
    Json(FeedStatusResponse {
        loaded: status.is_some(),
        status,
    })
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Plan itineraries between two coordinates.
async fn plan_itineraries(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PlanItinerariesResponse>, AppError> {
    // Parse JSON manually so we can log the body on failure
    let req: PlanItinerariesRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(&body), "Invalid plan request");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })?;
    let request = req.into_plan_request(session_id(&headers))?;

    let engine = state.engine.current().await?;
    let outcome = engine.plan(request).await?;

    Ok(Json(outcome.into()))
}

/// Stops around a point, with the lookup strategies that produced them.
async fn nearby_stops(
    State(state): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<NearbyResult>, AppError> {
    let query = params.to_query();
    if !query.point.is_valid() {
        return Err(AppError::BadRequest {
            message: format!("Invalid coordinate: {}, {}", params.lat, params.lon),
        });
    }

    let engine = state.engine.current().await?;
    Ok(Json(engine.nearby(&query)?))
}

/// Active services and schedule-day classification for a date.
async fn calendar_day(
    State(state): State<AppState>,
    Query(params): Query<CalendarDayParams>,
) -> Result<Json<CalendarDayResponse>, AppError> {
    let engine = state.engine.current().await?;
    let active = engine.active_services(params.date)?;
    let classification = engine.classify(params.date)?;

    Ok(Json(CalendarDayResponse {
        date: params.date,
        active_services: active.ids().iter().cloned().collect(),
        classification,
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotReady,
    BadRequest { message: String },
    Superseded,
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::NotReady => AppError::NotReady,
            EngineError::Cancelled => AppError::Superseded,
            EngineError::InvalidRequest(message) => AppError::BadRequest { message },
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                EngineError::NotReady.to_string(),
            ),
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Superseded => (StatusCode::CONFLICT, EngineError::Cancelled.to_string()),
        };

        warn!(%status, %message, "Request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
