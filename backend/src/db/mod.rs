//! History storage.
//!
//! Itinerary history lives behind the [`HistoryRepository`] trait so the
//! storage backend can be swapped without touching the HTTP layer.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers                                          │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs)                            │
//! │  - list limits, logging                                 │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Trait (repository/) - Abstract Interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//!     │                                │
//! ┌───▼───────────────┐     ┌──────────▼──────────────┐
//! │ Postgres (Diesel) │     │ Local Repository        │
//! │                   │     │ (in-memory)             │
//! └───────────────────┘     └─────────────────────────┘
//! ```
//!
//! # Usage
//! ```ignore
//! use trip_planner::db::{services, RepositoryFactory};
//!
//! let repo = RepositoryFactory::from_deployment().await?;
//! let history = services::list_history(repo.as_ref(), &session, Some(10)).await?;
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresConfig;

// ==================== Service Layer ====================

pub use services::{
    append_record, delete_record, get_record, health_check, list_history, DEFAULT_LIST_LIMIT,
    MAX_LIST_LIMIT,
};

// ==================== Repository Pattern Exports ====================

pub use factory::{RepositoryFactory, RepositoryType, StoreSelection};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{ErrorContext, HistoryRepository, RepositoryError, RepositoryResult};
