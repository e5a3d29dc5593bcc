//! `repository.toml`: an optional file that pins the history backend.
//!
//! ```toml
//! [repository]
//! type = "postgres"
//!
//! [postgres]
//! database_url = "postgres://planner@localhost/planner"
//! max_connections = 5
//! connect_timeout_sec = 10
//! ```
//!
//! Keys left out of `[postgres]` keep the defaults of `PostgresConfig`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(not(feature = "postgres-repo"))]
use super::factory::postgres_disabled;
use super::factory::{RepositoryType, StoreSelection};
#[cfg(feature = "postgres-repo")]
use super::repositories::PostgresConfig;
use super::repository::{RepositoryError, RepositoryResult};

/// Checked in order; the first existing file wins.
const SEARCH_PATHS: [&str; 3] = [
    "repository.toml",
    "backend/repository.toml",
    "../repository.toml",
];

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    pub repository: BackendSection,
    pub postgres: Option<PostgresSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSection {
    #[serde(rename = "type")]
    pub backend: RepositoryType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostgresSection {
    pub database_url: String,
    pub max_connections: Option<u32>,
    pub connect_timeout_sec: Option<u64>,
}

impl RepositoryConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// The first `repository.toml` in the standard locations.
    pub fn find_default() -> Option<PathBuf> {
        SEARCH_PATHS
            .into_iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
    }

    /// Resolve the file into a store choice, validating Postgres settings.
    pub fn selection(&self) -> RepositoryResult<StoreSelection> {
        match self.repository.backend {
            RepositoryType::Local => Ok(StoreSelection::Local),
            RepositoryType::Postgres => {
                let section = self.postgres.as_ref().ok_or_else(|| {
                    RepositoryError::configuration(
                        "type = \"postgres\" needs a [postgres] section with database_url",
                    )
                })?;
                section.selection()
            }
        }
    }
}

impl PostgresSection {
    #[cfg(feature = "postgres-repo")]
    fn selection(&self) -> RepositoryResult<StoreSelection> {
        let url = self.database_url.trim();
        if url.is_empty() {
            return Err(RepositoryError::configuration(
                "postgres.database_url must not be empty",
            ));
        }

        let mut config = PostgresConfig::with_url(url);
        if let Some(max) = self.max_connections {
            config.max_pool_size = max;
        }
        if let Some(timeout) = self.connect_timeout_sec {
            config.connection_timeout_sec = timeout;
        }
        config.validate()?;
        Ok(StoreSelection::Postgres(config))
    }

    #[cfg(not(feature = "postgres-repo"))]
    fn selection(&self) -> RepositoryResult<StoreSelection> {
        Err(postgres_disabled())
    }
}
