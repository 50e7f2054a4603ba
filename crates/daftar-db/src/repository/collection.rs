//! # Collection Repository
//!
//! Whole-collection snapshots keyed by `(namespace, name)`.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save_batch("shop-1", [sales, items, sequences])                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    UPSERT collections ('shop-1', 'sales', …)     version = version + 1 │
//! │    UPSERT collections ('shop-1', 'items', …)                           │
//! │    UPSERT collections ('shop-1', 'sequences', …)                       │
//! │  COMMIT  ← all three rows change, or none do                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

const UPSERT_SQL: &str = r#"
    INSERT INTO collections (namespace, name, payload, version, updated_at)
    VALUES (?, ?, ?, 1, ?)
    ON CONFLICT (namespace, name) DO UPDATE SET
        payload = excluded.payload,
        version = collections.version + 1,
        updated_at = excluded.updated_at
"#;

/// One collection to overwrite as part of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionWrite {
    pub name: String,
    pub payload: Value,
}

impl CollectionWrite {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        CollectionWrite {
            name: name.into(),
            payload,
        }
    }
}

/// Repository for collection snapshots.
#[derive(Debug, Clone)]
pub struct CollectionRepository {
    pool: SqlitePool,
}

impl CollectionRepository {
    /// Creates a new collection repository.
    pub fn new(pool: SqlitePool) -> Self {
        CollectionRepository { pool }
    }

    /// Loads a collection. `Ok(None)` when it was never saved.
    ///
    /// A stored payload that isn't JSON is reported as
    /// [`DbError::Serialization`], never as an empty collection.
    pub async fn load(&self, namespace: &str, name: &str) -> DbResult<Option<Value>> {
        debug!(namespace = %namespace, collection = %name, "Loading collection");

        let payload: Option<String> = sqlx::query_scalar(
            "SELECT payload FROM collections WHERE namespace = ? AND name = ?",
        )
        .bind(namespace)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match payload {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| DbError::serialization(name, e)),
            None => Ok(None),
        }
    }

    /// Overwrites a single collection.
    pub async fn save(&self, namespace: &str, name: &str, payload: &Value) -> DbResult<()> {
        let text = serde_json::to_string(payload).map_err(|e| DbError::serialization(name, e))?;

        sqlx::query(UPSERT_SQL)
            .bind(namespace)
            .bind(name)
            .bind(&text)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        debug!(namespace = %namespace, collection = %name, bytes = text.len(), "Collection saved");
        Ok(())
    }

    /// Overwrites several collections in one transaction.
    ///
    /// Every payload is encoded before the transaction opens, so an encoding
    /// failure writes nothing either.
    pub async fn save_batch(&self, namespace: &str, writes: &[CollectionWrite]) -> DbResult<()> {
        if writes.is_empty() {
            return Ok(());
        }

        let encoded = writes
            .iter()
            .map(|w| {
                serde_json::to_string(&w.payload)
                    .map(|text| (w.name.as_str(), text))
                    .map_err(|e| DbError::serialization(w.name.as_str(), e))
            })
            .collect::<DbResult<Vec<_>>>()?;

        let now = Utc::now().to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::rolled_back(encoded.len(), e))?;

        for (name, text) in &encoded {
            sqlx::query(UPSERT_SQL)
                .bind(namespace)
                .bind(*name)
                .bind(text)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::rolled_back(encoded.len(), e))?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::rolled_back(encoded.len(), e))?;

        debug!(
            namespace = %namespace,
            collections = encoded.len(),
            "Collection batch committed"
        );
        Ok(())
    }

    /// Lists the collection names stored under a namespace, sorted.
    pub async fn names(&self, namespace: &str) -> DbResult<Vec<String>> {
        let names = sqlx::query_scalar(
            "SELECT name FROM collections WHERE namespace = ? ORDER BY name",
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    /// Deletes every collection of a namespace. Returns the number removed.
    pub async fn delete_namespace(&self, namespace: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM collections WHERE namespace = ?")
            .bind(namespace)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            warn!(namespace = %namespace, removed, "Namespace deleted");
        }
        Ok(removed)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
