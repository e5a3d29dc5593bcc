//! Repository trait for session-scoped itinerary history.
//!
//! Every read and delete is keyed by `(session, id)` together. A record that
//! exists but belongs to another session is indistinguishable from one that
//! does not exist: both are `NotFound`.

use async_trait::async_trait;

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::api::{HistoryId, SessionId};
use crate::models::{HistoryRecord, HistorySummary, Itinerary, TravelIntent};

/// Storage contract for history records.
///
/// Records are write-once. Implementations must allocate ids so that
/// concurrent appends never collide and ids increase with insertion order.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Check if the storage backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Persist a new record with a fresh id and `created_at = now`.
    ///
    /// Atomic: either the full record is stored or nothing is.
    async fn append(
        &self,
        session: &SessionId,
        request: &TravelIntent,
        itinerary: &Itinerary,
    ) -> RepositoryResult<HistoryRecord>;

    /// Newest-first summaries of the session's records, at most `limit`.
    async fn list(
        &self,
        session: &SessionId,
        limit: usize,
    ) -> RepositoryResult<Vec<HistorySummary>>;

    /// Fetch one record owned by `session`.
    async fn get(&self, session: &SessionId, id: HistoryId) -> RepositoryResult<HistoryRecord>;

    /// Delete one record owned by `session`.
    async fn delete(&self, session: &SessionId, id: HistoryId) -> RepositoryResult<()>;
}
