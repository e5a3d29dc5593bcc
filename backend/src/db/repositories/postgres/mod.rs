//! Postgres history store using Diesel.
//!
//! Connections come from an r2d2 pool and embedded migrations run when the
//! store opens. Each operation runs once on a blocking worker: a failed
//! append is never replayed, so one synthesis can never leave two rows.
//!
//! ## Configuration
//!
//! - `DATABASE_URL` or `PG_DATABASE_URL`: connection string (required)
//! - `PG_POOL_MAX`: maximum pool size (default: 10)
//! - `PG_CONN_TIMEOUT_SEC`: connection checkout timeout in seconds (default: 30)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::api::{HistoryId, SessionId};
use crate::db::repository::{HistoryRepository, RepositoryError, RepositoryResult};
use crate::models::{HistoryRecord, HistorySummary, Itinerary, TravelIntent};

mod models;
mod schema;

use models::*;
use schema::travel_records;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

pub const DEFAULT_POOL_MAX: u32 = 10;
pub const DEFAULT_CONN_TIMEOUT_SEC: u64 = 30;

/// Connection settings for the Postgres store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_pool_size: u32,
    pub connection_timeout_sec: u64,
}

impl PostgresConfig {
    /// Default pool settings for `database_url`.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_pool_size: DEFAULT_POOL_MAX,
            connection_timeout_sec: DEFAULT_CONN_TIMEOUT_SEC,
        }
    }

    pub fn from_env() -> RepositoryResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset and a
    /// value that does not parse is an error, not a silent default.
    pub fn from_lookup<F>(lookup: F) -> RepositoryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL")
            .or_else(|| get("PG_DATABASE_URL"))
            .ok_or_else(|| {
                RepositoryError::configuration("DATABASE_URL or PG_DATABASE_URL must be set")
            })?;

        let mut config = Self::with_url(database_url);
        if let Some(raw) = get("PG_POOL_MAX") {
            config.max_pool_size = parse_setting("PG_POOL_MAX", &raw)?;
        }
        if let Some(raw) = get("PG_CONN_TIMEOUT_SEC") {
            config.connection_timeout_sec = parse_setting("PG_CONN_TIMEOUT_SEC", &raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// A pool of zero connections or a zero timeout can never serve a request.
    pub fn validate(&self) -> RepositoryResult<()> {
        if self.max_pool_size == 0 {
            return Err(RepositoryError::configuration("pool size must be at least 1"));
        }
        if self.connection_timeout_sec == 0 {
            return Err(RepositoryError::configuration(
                "connection timeout must be at least 1 second",
            ));
        }
        Ok(())
    }
}

fn parse_setting<T>(key: &str, raw: &str) -> RepositoryResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| {
        RepositoryError::configuration(format!("{}={:?} is invalid: {}", key, raw, e))
    })
}

/// Diesel-backed history repository for Postgres.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.pool.state();
        f.debug_struct("PostgresRepository")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl PostgresRepository {
    /// Open the pool and run pending migrations. Blocks; call it from a
    /// blocking worker.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        config.validate()?;
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| RepositoryError::unavailable(e.to_string()).during("open"))?;

        let mut conn = pool
            .get()
            .map_err(|e| RepositoryError::from(e).during("migrate"))?;
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::configuration(format!("migrations failed: {}", e))
        })?;

        Ok(Self { pool })
    }

    /// Run `f` on a pooled connection inside a blocking worker.
    ///
    /// Once spawned the closure runs to completion even if the caller's
    /// future is dropped, so a transaction is either committed or rolled back,
    /// never abandoned half way.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();

        task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| RepositoryError::worker(e.to_string()))
        .and_then(|result| result)
        .map_err(|e| e.during(operation))
    }
}

fn encode<T: serde::Serialize>(value: &T) -> RepositoryResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| RepositoryError::corrupt(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    column: &str,
    id: i64,
) -> RepositoryResult<T> {
    serde_json::from_value(value).map_err(|e| {
        RepositoryError::corrupt(format!("{}: {}", column, e)).for_record(HistoryId(id))
    })
}

fn days_from_db(value: i32, id: i64) -> RepositoryResult<u32> {
    u32::try_from(value).map_err(|_| {
        RepositoryError::corrupt(format!("negative trip length {}", value))
            .for_record(HistoryId(id))
    })
}

fn row_to_record(row: TravelRecordRow, session: SessionId) -> RepositoryResult<HistoryRecord> {
    Ok(HistoryRecord {
        id: HistoryId(row.id),
        session_id: session,
        request: decode::<TravelIntent>(row.request_json, "request_json", row.id)?,
        itinerary: decode::<Itinerary>(row.itinerary_json, "itinerary_json", row.id)?,
        created_at: row.created_at,
    })
}

fn summary_from_row(row: TravelRecordSummaryRow) -> RepositoryResult<HistorySummary> {
    Ok(HistorySummary {
        id: HistoryId(row.id),
        origin: row.origin,
        destination: row.destination,
        departure_date: row.departure_date,
        trip_length_days: days_from_db(row.trip_length_days, row.id)?,
        created_at: row.created_at,
    })
}

#[async_trait]
impl HistoryRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn append(
        &self,
        session: &SessionId,
        request: &TravelIntent,
        itinerary: &Itinerary,
    ) -> RepositoryResult<HistoryRecord> {
        let trip_length_days = i32::try_from(request.trip_length_days)
            .map_err(|_| RepositoryError::corrupt("trip length does not fit the column"))?;
        let row = NewTravelRecordRow {
            session_id: session.as_str().to_string(),
            origin: request.origin.clone(),
            destination: request.destination.clone(),
            departure_date: request.departure_date,
            trip_length_days,
            language: request.language.clone(),
            request_json: encode(request)?,
            itinerary_json: encode(itinerary)?,
        };
        let session = session.clone();

        self.with_conn("append", move |conn| {
            let stored: TravelRecordRow = conn.transaction(|tx| {
                diesel::insert_into(travel_records::table)
                    .values(&row)
                    .returning(TravelRecordRow::as_returning())
                    .get_result(tx)
            })?;
            row_to_record(stored, session)
        })
        .await
    }

    async fn list(
        &self,
        session: &SessionId,
        limit: usize,
    ) -> RepositoryResult<Vec<HistorySummary>> {
        let session_key = session.as_str().to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_conn("list", move |conn| {
            let rows: Vec<TravelRecordSummaryRow> = travel_records::table
                .filter(travel_records::session_id.eq(&session_key))
                .order((travel_records::created_at.desc(), travel_records::id.desc()))
                .limit(limit)
                .select(TravelRecordSummaryRow::as_select())
                .load(conn)?;
            rows.into_iter().map(summary_from_row).collect()
        })
        .await
    }

    async fn get(&self, session: &SessionId, id: HistoryId) -> RepositoryResult<HistoryRecord> {
        let session = session.clone();

        self.with_conn("get", move |conn| {
            let row: Option<TravelRecordRow> = travel_records::table
                .filter(travel_records::session_id.eq(session.as_str()))
                .filter(travel_records::id.eq(id.value()))
                .select(TravelRecordRow::as_select())
                .first(conn)
                .optional()?;
            match row {
                Some(row) => row_to_record(row, session),
                None => Err(RepositoryError::not_found(id)),
            }
        })
        .await
    }

    async fn delete(&self, session: &SessionId, id: HistoryId) -> RepositoryResult<()> {
        let session_key = session.as_str().to_string();

        self.with_conn("delete", move |conn| {
            let deleted = diesel::delete(
                travel_records::table
                    .filter(travel_records::session_id.eq(&session_key))
                    .filter(travel_records::id.eq(id.value())),
            )
            .execute(conn)?;
            if deleted == 0 {
                Err(RepositoryError::not_found(id))
            } else {
                Ok(())
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn url_alone_gets_default_pool_settings() {
        let config =
            PostgresConfig::from_lookup(lookup(&[("PG_DATABASE_URL", "postgres://db/planner")]))
                .unwrap();
        assert_eq!(config, PostgresConfig::with_url("postgres://db/planner"));
        assert_eq!(config.max_pool_size, DEFAULT_POOL_MAX);
        assert_eq!(config.connection_timeout_sec, DEFAULT_CONN_TIMEOUT_SEC);
    }

    #[test]
    fn database_url_wins_over_the_pg_alias() {
        let config = PostgresConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://primary/planner"),
            ("PG_DATABASE_URL", "postgres://alias/planner"),
            ("PG_POOL_MAX", "4"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "postgres://primary/planner");
        assert_eq!(config.max_pool_size, 4);
    }

    #[test]
    fn bad_pool_settings_are_rejected() {
        let err = PostgresConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, RepositoryError::Configuration(_)));

        let err = PostgresConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/planner"),
            ("PG_POOL_MAX", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PG_POOL_MAX"));

        assert!(PostgresConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/planner"),
            ("PG_CONN_TIMEOUT_SEC", "0"),
        ]))
        .is_err());
    }

    #[test]
    fn negative_trip_length_is_corrupt() {
        assert_eq!(days_from_db(3, 1).unwrap(), 3);
        let err = days_from_db(-1, 9).unwrap_err();
        assert!(matches!(err, RepositoryError::Corrupt { .. }));
        assert_eq!(err.context().record, Some(HistoryId(9)));
    }
}
