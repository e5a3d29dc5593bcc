//! In-memory local repository implementation.
//!
//! Suitable for unit testing and local development. Records live in a
//! `BTreeMap` keyed by `(session, id)`, so ownership is part of the lookup
//! key rather than a filter applied afterwards.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::{HistoryId, SessionId};
use crate::db::repository::{HistoryRepository, RepositoryError, RepositoryResult};
use crate::models::{HistoryRecord, HistorySummary, Itinerary, TravelIntent};

/// In-memory local repository.
///
/// # Example
/// ```
/// use trip_planner::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.record_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    records: BTreeMap<(SessionId, HistoryId), HistoryRecord>,

    // Allocated under the same write lock as the insert.
    next_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Simulate a storage outage. Every operation fails while unhealthy.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Total records across all sessions.
    pub fn record_count(&self) -> usize {
        self.data.read().records.len()
    }

    /// Drop every record. Ids keep increasing.
    pub fn clear(&self) {
        self.data.write().records.clear();
    }

    fn ensure_healthy(data: &LocalData, operation: &'static str) -> RepositoryResult<()> {
        if data.is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::unavailable("local store is marked unhealthy").during(operation))
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn append(
        &self,
        session: &SessionId,
        request: &TravelIntent,
        itinerary: &Itinerary,
    ) -> RepositoryResult<HistoryRecord> {
        let mut data = self.data.write();
        Self::ensure_healthy(&data, "append")?;

        let id = HistoryId(data.next_id);
        data.next_id += 1;

        let record = HistoryRecord {
            id,
            session_id: session.clone(),
            request: request.clone(),
            itinerary: itinerary.clone(),
            created_at: Utc::now(),
        };
        data.records.insert((session.clone(), id), record.clone());
        Ok(record)
    }

    async fn list(
        &self,
        session: &SessionId,
        limit: usize,
    ) -> RepositoryResult<Vec<HistorySummary>> {
        let data = self.data.read();
        Self::ensure_healthy(&data, "list")?;

        let lower = (session.clone(), HistoryId(i64::MIN));
        let upper = (session.clone(), HistoryId(i64::MAX));
        let mut summaries: Vec<HistorySummary> = data
            .records
            .range(lower..=upper)
            .map(|(_, record)| HistorySummary::from(record))
            .collect();

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        summaries.truncate(limit);
        Ok(summaries)
    }

    async fn get(&self, session: &SessionId, id: HistoryId) -> RepositoryResult<HistoryRecord> {
        let data = self.data.read();
        Self::ensure_healthy(&data, "get")?;

        data.records
            .get(&(session.clone(), id))
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(id).during("get"))
    }

    async fn delete(&self, session: &SessionId, id: HistoryId) -> RepositoryResult<()> {
        let mut data = self.data.write();
        Self::ensure_healthy(&data, "delete")?;

        data.records
            .remove(&(session.clone(), id))
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found(id).during("delete"))
    }
}
