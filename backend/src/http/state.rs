//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::SessionConfig;
use crate::db::repository::HistoryRepository;
use crate::services::Synthesizer;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// History storage backend
    pub repository: Arc<dyn HistoryRepository>,
    /// Provider-backed itinerary synthesizer
    pub synthesizer: Synthesizer,
    /// Session cookie settings
    pub session: Arc<SessionConfig>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn HistoryRepository>,
        synthesizer: Synthesizer,
        session: SessionConfig,
    ) -> Self {
        Self {
            repository,
            synthesizer,
            session: Arc::new(session),
        }
    }
}
