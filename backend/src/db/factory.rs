//! Opens the history store the deployment asks for.
//!
//! A `repository.toml` in one of the standard locations pins the backend;
//! without one the environment decides. Either way the store is handed out as
//! `Arc<dyn HistoryRepository>` so the HTTP layer never names a concrete type.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::repo_config::RepositoryConfig;
use super::repositories::LocalRepository;
use super::repository::{HistoryRepository, RepositoryError, RepositoryResult};
#[cfg(feature = "postgres-repo")]
use super::repositories::{PostgresConfig, PostgresRepository};

/// Backend named by `REPOSITORY_TYPE` or `[repository] type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum RepositoryType {
    Postgres,
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("unknown repository type '{}'", s.trim())),
        }
    }
}

impl TryFrom<String> for RepositoryType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl RepositoryType {
    /// `REPOSITORY_TYPE` when set; otherwise a database URL selects Postgres
    /// and its absence selects the in-memory store.
    pub fn from_env() -> RepositoryResult<Self> {
        let set = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        if let Some(value) = set("REPOSITORY_TYPE") {
            return value.parse().map_err(RepositoryError::configuration);
        }
        if set("DATABASE_URL").is_some() || set("PG_DATABASE_URL").is_some() {
            Ok(Self::Postgres)
        } else {
            Ok(Self::Local)
        }
    }
}

#[cfg(not(feature = "postgres-repo"))]
pub(crate) fn postgres_disabled() -> RepositoryError {
    RepositoryError::configuration("built without the postgres-repo feature")
}

/// A resolved backend choice carrying everything needed to open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSelection {
    Local,
    #[cfg(feature = "postgres-repo")]
    Postgres(PostgresConfig),
}

impl StoreSelection {
    pub fn from_env() -> RepositoryResult<Self> {
        match RepositoryType::from_env()? {
            RepositoryType::Local => Ok(Self::Local),
            #[cfg(feature = "postgres-repo")]
            RepositoryType::Postgres => Ok(Self::Postgres(PostgresConfig::from_env()?)),
            #[cfg(not(feature = "postgres-repo"))]
            RepositoryType::Postgres => Err(postgres_disabled()),
        }
    }

    pub fn backend(&self) -> RepositoryType {
        match self {
            Self::Local => RepositoryType::Local,
            #[cfg(feature = "postgres-repo")]
            Self::Postgres(_) => RepositoryType::Postgres,
        }
    }
}

/// Builds history stores.
///
/// # Example
/// ```
/// use trip_planner::db::RepositoryFactory;
///
/// let repo = RepositoryFactory::create_local();
/// assert_eq!(std::sync::Arc::strong_count(&repo), 1);
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// The store the server runs with: `repository.toml` when one is found,
    /// the environment otherwise.
    pub async fn from_deployment() -> RepositoryResult<Arc<dyn HistoryRepository>> {
        match RepositoryConfig::find_default() {
            Some(path) => Self::from_config_file(&path).await,
            None => Self::open(StoreSelection::from_env()?).await,
        }
    }

    pub async fn from_config_file<P: AsRef<Path>>(
        path: P,
    ) -> RepositoryResult<Arc<dyn HistoryRepository>> {
        info!(path = %path.as_ref().display(), "reading repository configuration");
        let selection = RepositoryConfig::from_file(path)?.selection()?;
        Self::open(selection).await
    }

    /// Open the selected store. Postgres connects and migrates on a blocking
    /// worker before this returns.
    pub async fn open(selection: StoreSelection) -> RepositoryResult<Arc<dyn HistoryRepository>> {
        info!(backend = ?selection.backend(), "opening history store");
        match selection {
            StoreSelection::Local => Ok(Self::create_local()),
            #[cfg(feature = "postgres-repo")]
            StoreSelection::Postgres(config) => {
                let repo = tokio::task::spawn_blocking(move || PostgresRepository::new(config))
                    .await
                    .map_err(|e| RepositoryError::worker(e.to_string()).during("open"))??;
                Ok(Arc::new(repo))
            }
        }
    }

    pub fn create_local() -> Arc<dyn HistoryRepository> {
        Arc::new(LocalRepository::new())
    }
}
