//! # Storage Errors
//!
//! ```text
//!  sqlx::Error ─┐
//!  MigrateError ├──► DbError ──► EngineError::PersistenceFailed / Storage
//!  serde_json ──┘                  (in-memory state already rolled back)
//! ```
//!
//! [`DbError::Busy`] and [`DbError::Unavailable`] are worth retrying as-is;
//! the rest need someone to look at the file.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// The database file could not be opened or created.
    #[error("Cannot open database at {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Schema migration failed: {0}")]
    Migration(String),

    /// A statement against the `collections` table failed.
    #[error("Collection query failed: {0}")]
    Query(String),

    /// The batch transaction did not commit; none of its collections changed.
    #[error("Batch of {collections} collection(s) rolled back: {reason}")]
    BatchRolledBack { collections: usize, reason: String },

    /// A stored payload is not valid JSON, or a value could not be encoded.
    #[error("Payload of collection '{collection}' is not valid JSON: {reason}")]
    Serialization { collection: String, reason: String },

    /// Another writer held the file for longer than the busy timeout.
    #[error("Database is busy")]
    Busy,

    /// The store refused the operation (closed pool, I/O failure, non-SQLite
    /// stores).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl DbError {
    pub fn serialization(collection: impl Into<String>, err: serde_json::Error) -> Self {
        DbError::Serialization {
            collection: collection.into(),
            reason: err.to_string(),
        }
    }

    /// Wraps a failure inside a batch transaction. Busy stays [`DbError::Busy`].
    pub fn rolled_back(collections: usize, err: sqlx::Error) -> Self {
        match DbError::from(err) {
            DbError::Query(reason) | DbError::Unavailable(reason) => {
                DbError::BatchRolledBack {
                    collections,
                    reason,
                }
            }
            other => other,
        }
    }

    /// True when the same write may succeed if tried again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Busy | DbError::Unavailable(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DbError::Busy,
            sqlx::Error::Database(db_err) if db_err.message().contains("database is locked") => {
                DbError::Busy
            }
            sqlx::Error::Database(db_err) => DbError::Query(db_err.message().to_string()),
            sqlx::Error::PoolClosed => DbError::Unavailable("pool is closed".to_string()),
            sqlx::Error::Io(io) => DbError::Unavailable(io.to_string()),
            other => DbError::Query(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
