//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! planning pipeline in [`crate::services`] or the history service layer.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use tracing::{info, warn};

use super::dto::{
    DeleteResponse, HealthResponse, HistoryRecord, HistorySummary, Itinerary, ListQuery,
    RawTravelRequest, RootResponse,
};
use super::error::AppError;
use super::session::CurrentSession;
use super::state::AppState;
use crate::api::HistoryId;
use crate::db::services as db_services;
use crate::services::{normalize, ValidationError};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

pub const SERVICE_NAME: &str = "AI Travel Planner API";

// =============================================================================
// Service info
// =============================================================================

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        ok: true,
        service: SERVICE_NAME.to_string(),
    })
}

/// GET /health
///
/// Reports whether the service is up and the history store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => {
            warn!(error = %e, "health: history store check failed");
            "error".to_string()
        }
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Planning
// =============================================================================

/// POST /plan
///
/// Normalize the request, synthesize an itinerary and record it in the
/// caller's history. Nothing is stored unless synthesis succeeds.
pub async fn plan(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    body: Result<Json<RawTravelRequest>, JsonRejection>,
) -> HandlerResult<Itinerary> {
    let Json(raw) = body.map_err(|rejection| {
        AppError::Validation(ValidationError::new("body", rejection.body_text()))
    })?;
    let intent = normalize(&raw)?;

    info!(
        session = session.log_prefix(),
        destination = %intent.destination,
        days = intent.trip_length_days,
        provider = state.synthesizer.provider_name(),
        "planning trip"
    );

    let itinerary = state.synthesizer.synthesize(&intent).await?;
    db_services::append_record(state.repository.as_ref(), &session, &intent, &itinerary).await?;

    Ok(Json(itinerary))
}

// =============================================================================
// History
// =============================================================================

/// GET /history
pub async fn list_history(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> HandlerResult<Vec<HistorySummary>> {
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let summaries =
        db_services::list_history(state.repository.as_ref(), &session, query.limit).await?;
    Ok(Json(summaries))
}

/// GET /history/{id}
pub async fn get_history(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    id: Result<Path<i64>, PathRejection>,
) -> HandlerResult<HistoryRecord> {
    let id = history_id(id)?;
    let record = db_services::get_record(state.repository.as_ref(), &session, id).await?;
    Ok(Json(record))
}

/// DELETE /history/{id}
pub async fn delete_history(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    id: Result<Path<i64>, PathRejection>,
) -> HandlerResult<DeleteResponse> {
    let id = history_id(id)?;
    db_services::delete_record(state.repository.as_ref(), &session, id).await?;
    Ok(Json(DeleteResponse {
        message: "Record deleted successfully".to_string(),
        id,
    }))
}

fn history_id(path: Result<Path<i64>, PathRejection>) -> Result<HistoryId, AppError> {
    path.map(|Path(id)| HistoryId::new(id))
        .map_err(|_| AppError::BadRequest("History id must be an integer".to_string()))
}
