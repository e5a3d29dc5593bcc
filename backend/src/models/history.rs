//! Persisted history types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::intent::TravelIntent;
use super::itinerary::Itinerary;
use crate::api::{HistoryId, SessionId};

/// A stored itinerary together with the request that produced it.
///
/// Write-once: there is no update path, only append and delete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub id: HistoryId,
    #[serde(skip_serializing)]
    pub session_id: SessionId,
    pub request: TravelIntent,
    pub itinerary: Itinerary,
    pub created_at: DateTime<Utc>,
}

/// Row shown in the history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub id: HistoryId,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub trip_length_days: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&HistoryRecord> for HistorySummary {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            id: record.id,
            origin: record.request.origin.clone(),
            destination: record.request.destination.clone(),
            departure_date: record.request.departure_date,
            trip_length_days: record.request.trip_length_days,
            created_at: record.created_at,
        }
    }
}
