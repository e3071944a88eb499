//! # SQLite Pool
//!
//! One SQLite file is the shared state of every API instance. The pool is
//! configured so that this file, not process memory, is what serializes
//! ticket sales.
//!
//! ## Writers and the Oversell Guarantee
//! ```text
//!  POST /orders (A) ── BEGIN ── INSERT orders ─┐  writer lock held by A
//!  POST /orders (B) ── BEGIN ── INSERT orders ─┼─ waits (busy_timeout)
//!  GET  /queues/…   ── SELECT ─────────────────┘  WAL: never waits
//!                                               │
//!  A: UPDATE zones … WHERE purchased + q <= capacity ── COMMIT
//!  B: acquires the lock, sees A's commit, its guarded UPDATE matches 0 rows
//! ```
//!
//! SQLite admits one writer at a time per file. Order and confirmation
//! transactions write before they read, so each one takes the writer lock at
//! its first statement and every later read sees all earlier commits. WAL
//! journaling keeps position polls and pricing reads off that lock.
//!
//! `busy_timeout` is how long a writer queues behind another before SQLite
//! returns `database is locked`. It bounds the worst-case latency of a
//! placement during an on-sale burst; too short and contenders fail instead
//! of queuing.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::catalog::CatalogRepository;
use crate::repository::order::OrderRepository;
use crate::repository::points::PointsRepository;
use crate::repository::queue::QueueRepository;

/// Pool settings for one SQLite file.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/taquilla/taquilla.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,

    /// Concurrent requests served from this instance. Writes still go one at
    /// a time. Default: 5
    pub max_connections: u32,

    /// How long a request waits for a free connection. Default: 30 seconds
    pub acquire_timeout: Duration,

    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// `None` keeps idle connections open. Default: 10 minutes
    pub idle_timeout: Option<Duration>,
}

impl DbConfig {
    /// File-backed configuration; the file is created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// A private in-memory database for tests.
    ///
    /// Each `:memory:` connection is its own database, so the pool is pinned
    /// to one connection that never idles out.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: None,
        }
    }
}

/// Handle to the ticketing database. Clones share one pool.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("taquilla.db")).await?;
/// let zones = db.catalog().zones_for_event("evt-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database and applies pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Opening ticketing database"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            // A crash may lose the last commit but never tears one
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!("Pool connected, applying migrations");
        migrations::run_migrations(&pool).await?;

        Ok(Database { pool })
    }

    /// Queues and turns.
    pub fn queues(&self) -> QueueRepository {
        QueueRepository::new(self.pool.clone())
    }

    /// Events, zones and tariffs.
    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.pool.clone())
    }

    /// Orders, lines and the placement/confirmation transaction.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub fn points(&self) -> PointsRepository {
        PointsRepository::new(self.pool.clone())
    }

    /// Closes the pool after the HTTP server has drained.
    pub async fn close(&self) {
        info!("Closing ticketing database");
        self.pool.close().await;
    }

    /// `SELECT 1` round trip, reported by `GET /health`.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        db.close().await;
        assert!(!db.health_check().await);
    }

    #[tokio::test]
    async fn test_file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("wal.db")).max_connections(2))
            .await
            .unwrap();

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        db.close().await;
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .busy_timeout(Duration::from_secs(1));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
        assert_eq!(DbConfig::in_memory().max_connections, 1);
        assert!(DbConfig::in_memory().idle_timeout.is_none());
    }
}
