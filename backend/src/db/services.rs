//! History service layer.
//!
//! Repository-agnostic operations on itinerary history. These functions own
//! the behavior that must not differ between backends: list limits, logging
//! and error context.
//!
//! # Usage
//!
//! ```no_run
//! use trip_planner::api::SessionId;
//! use trip_planner::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let session = SessionId::generate();
//!
//!     let history = services::list_history(&repo, &session, None).await?;
//!     println!("Found {} trips", history.len());
//!
//!     Ok(())
//! }
//! ```

use tracing::{debug, info, warn};

use super::repository::{HistoryRepository, RepositoryResult};
use crate::api::{HistoryId, SessionId};
use crate::models::{HistoryRecord, HistorySummary, Itinerary, TravelIntent};

/// Entries returned by a list call when the client does not ask for a limit.
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Upper bound on entries returned by one list call.
pub const MAX_LIST_LIMIT: usize = 100;

// ==================== Health & Connection ====================

/// Check if the storage backend is reachable.
pub async fn health_check<R: HistoryRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== History Operations ====================

/// Persist a synthesized itinerary for `session`.
///
/// Called only after synthesis succeeded, so the history never holds a
/// partial or invalid itinerary.
pub async fn append_record<R: HistoryRepository + ?Sized>(
    repo: &R,
    session: &SessionId,
    request: &TravelIntent,
    itinerary: &Itinerary,
) -> RepositoryResult<HistoryRecord> {
    let record = repo
        .append(session, request, itinerary)
        .await
        .inspect_err(|e| {
            warn!(session = session.log_prefix(), error = %e, "failed to persist itinerary")
        })?;

    info!(
        session = session.log_prefix(),
        id = %record.id,
        destination = %request.destination,
        days = request.trip_length_days,
        "stored itinerary"
    );
    Ok(record)
}

/// Clamp a requested list size into `1..=MAX_LIST_LIMIT`.
pub fn effective_limit(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT)
}

/// Newest-first summaries of the session's history.
pub async fn list_history<R: HistoryRepository + ?Sized>(
    repo: &R,
    session: &SessionId,
    limit: Option<usize>,
) -> RepositoryResult<Vec<HistorySummary>> {
    let limit = effective_limit(limit);
    let summaries = repo.list(session, limit).await?;
    debug!(
        session = session.log_prefix(),
        limit,
        returned = summaries.len(),
        "listed history"
    );
    Ok(summaries)
}

/// Fetch one record owned by `session`.
pub async fn get_record<R: HistoryRepository + ?Sized>(
    repo: &R,
    session: &SessionId,
    id: HistoryId,
) -> RepositoryResult<HistoryRecord> {
    repo.get(session, id).await.inspect_err(|e| {
        if e.is_not_found() {
            debug!(session = session.log_prefix(), %id, "history record not visible");
        }
    })
}

/// Delete one record owned by `session`.
pub async fn delete_record<R: HistoryRepository + ?Sized>(
    repo: &R,
    session: &SessionId,
    id: HistoryId,
) -> RepositoryResult<()> {
    repo.delete(session, id).await?;
    info!(session = session.log_prefix(), %id, "deleted history record");
    Ok(())
}
