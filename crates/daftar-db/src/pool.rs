//! # Opening the Collection Database
//!
//! One SQLite file holds every namespace. [`Database::new`] opens it, brings
//! the `collections` table up to date and hands out
//! [`CollectionRepository`] handles over a shared pool.
//!
//! ```text
//!  DbConfig::new("daftar.db")          DbConfig::in_memory()
//!        │  file, WAL, busy timeout           │  one private connection
//!        └──────────────┬─────────────────────┘
//!                       ▼
//!              Database::new ── migrations ──► collections table
//!                       │
//!                       ▼
//!              db.collections()  /  CollectionStore
//! ```
//!
//! Batches are written by one writer at a time; WAL lets loads run while a
//! batch commits.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::collection::CollectionRepository;

/// Where the collections live and how many connections may read them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// `None` for a private in-memory database.
    pub path: Option<PathBuf>,

    /// Default: 5. An in-memory database always uses one.
    pub max_connections: u32,

    /// How long a write waits on a locked file before failing with
    /// [`DbError::Busy`]. Default: 5 seconds.
    pub busy_timeout: Duration,
}

impl DbConfig {
    /// A database file, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            path: Some(path.into()),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// A database that lives as long as the returned [`Database`].
    pub fn in_memory() -> Self {
        DbConfig {
            path: None,
            max_connections: 1,
            busy_timeout: Duration::from_secs(5),
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

    fn describe(&self) -> String {
        self.path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string())
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = SqliteConnectOptions::new().busy_timeout(self.busy_timeout);
        match self.path.as_deref() {
            Some(path) => file_options(options, path),
            None => options,
        }
    }
}

fn file_options(options: SqliteConnectOptions, path: &Path) -> SqliteConnectOptions {
    options
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
}

/// Handle to the collection database. Clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database and applies pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let location = config.describe();
        info!(path = %location, "Opening collection database");

        // Every connection to :memory: is its own database, so the single
        // connection must never be reaped.
        let pool_options = match config.path {
            Some(_) => SqlitePoolOptions::new().max_connections(config.max_connections.max(1)),
            None => SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        };

        let pool = pool_options
            .min_connections(1)
            .acquire_timeout(config.busy_timeout)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::Open {
                path: location.clone(),
                reason: e.to_string(),
            })?;
        debug!(path = %location, "Pool ready");

        migrations::run_migrations(&pool).await?;
        Ok(Database { pool })
    }

    pub fn collections(&self) -> CollectionRepository {
        CollectionRepository::new(self.pool.clone())
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CollectionStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated_and_private() {
        let first = Database::new(DbConfig::in_memory()).await.unwrap();
        let second = Database::new(DbConfig::in_memory()).await.unwrap();

        first.save("shop", "items", &json!([])).await.unwrap();

        assert_eq!(first.load("shop", "items").await.unwrap(), Some(json!([])));
        assert_eq!(second.load("shop", "items").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let path = std::env::temp_dir().join(format!("daftar-{}.db", uuid::Uuid::new_v4()));

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.save("shop", "sales", &json!([{"id": "s-1"}])).await.unwrap();
        drop(db);

        let reopened = Database::new(DbConfig::new(&path).max_connections(2))
            .await
            .unwrap();
        assert_eq!(
            reopened.load("shop", "sales").await.unwrap(),
            Some(json!([{"id": "s-1"}]))
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_config_defaults() {
        let config = DbConfig::new("/tmp/daftar.db").busy_timeout(Duration::from_millis(250));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.describe(), "/tmp/daftar.db");

        assert_eq!(DbConfig::in_memory().describe(), ":memory:");
    }

    #[tokio::test]
    async fn test_unopenable_path_is_an_open_error() {
        let path = std::env::temp_dir()
            .join(format!("daftar-missing-{}", uuid::Uuid::new_v4()))
            .join("nested")
            .join("daftar.db");

        let err = Database::new(DbConfig::new(path)).await.unwrap_err();
        assert!(matches!(err, DbError::Open { .. }));
    }
}
