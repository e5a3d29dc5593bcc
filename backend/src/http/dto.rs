//! Data Transfer Objects for the HTTP API.
//!
//! Itineraries and history records serialize directly from the domain types
//! in [`crate::models`]; only envelope types live here.

use serde::{Deserialize, Serialize};

pub use crate::models::{HistoryRecord, HistorySummary, Itinerary, RawTravelRequest};

use crate::api::HistoryId;

/// Response of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub ok: bool,
    pub service: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// API version
    pub version: String,
    /// Storage status
    pub database: String,
}

/// Query parameters of `GET /history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// Acknowledgement of `DELETE /history/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: HistoryId,
}
