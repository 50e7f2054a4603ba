//! # Collection Store Port
//!
//! The seam between the engine and storage. The engine only ever sees
//! [`CollectionStore`]; [`Database`] is the SQLite adapter.
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────────┐
//! │  daftar-engine Books │ ─────► │  dyn CollectionStore     │
//! └──────────────────────┘        └────────────┬─────────────┘
//!                                              │
//!                          ┌───────────────────┴──────────────┐
//!                          │                                  │
//!                  Database (SQLite)               test doubles (flaky,
//!                                                  recording, ...)
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DbResult;
use crate::pool::Database;
pub use crate::repository::collection::CollectionWrite;

/// Durable storage of whole collections, scoped by namespace.
///
/// Implementations must make `save_batch` all-or-nothing.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Loads a collection; `Ok(None)` if it was never written.
    async fn load(&self, namespace: &str, name: &str) -> DbResult<Option<Value>>;

    /// Overwrites every collection in `writes` atomically.
    async fn save_batch(&self, namespace: &str, writes: &[CollectionWrite]) -> DbResult<()>;

    /// Overwrites one collection.
    async fn save(&self, namespace: &str, name: &str, payload: &Value) -> DbResult<()> {
        self.save_batch(namespace, &[CollectionWrite::new(name, payload.clone())])
            .await
    }
}

#[async_trait]
impl CollectionStore for Database {
    async fn load(&self, namespace: &str, name: &str) -> DbResult<Option<Value>> {
        self.collections().load(namespace, name).await
    }

    async fn save_batch(&self, namespace: &str, writes: &[CollectionWrite]) -> DbResult<()> {
        self.collections().save_batch(namespace, writes).await
    }

    async fn save(&self, namespace: &str, name: &str, payload: &Value) -> DbResult<()> {
        self.collections().save(namespace, name, payload).await
    }
}
