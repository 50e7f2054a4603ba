//! # Books
//!
//! The composition root: one open business activity.
//!
//! ## Mutation Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  every mutating operation                                               │
//! │                                                                         │
//! │  validate ──✗──► Err(warning)          nothing touched                  │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  confirm? ──✗──► Ok(None)              delete-class operations only     │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  snapshot = state.clone()                                               │
//! │  mutate state in memory                                                 │
//! │  store.save_batch(namespace, [every touched collection])                │
//! │     │                                                                   │
//! │     ├──✓──► Ok(..)                     notify success                   │
//! │     └──✗──► state = snapshot           notify error                     │
//! │             Err(PersistenceFailed)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Operations take `&mut self` and run to completion one at a time. A
//! mutation is only visible to readers after its write has resolved.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use daftar_core::{
    CashEntry, CashKind, Document, DocumentKind, EntityType, Item, ItemRepository, Money, Party,
    PartyKind, PartyRepository, TombstoneStore,
};
use daftar_db::{CollectionStore, Database};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::ports::{
    AutoConfirm, ConfirmRequest, ConfirmationGate, NoOpNotifier, Notification, NotificationSink,
};
use crate::state::{describe, Collection, LedgerState};

// =============================================================================
// Pending renames
// =============================================================================

/// A rename whose write failed and has not been applied yet.
///
/// Stored with the other collections so it survives a restart. Retried with
/// [`Books::retry_pending_renames`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRename {
    pub entity_type: EntityType,
    pub record_id: String,
    pub old_name: String,
    pub new_name: String,
    pub failed_at: DateTime<Utc>,
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Books`].
///
/// ```rust,ignore
/// let books = BooksBuilder::new(Arc::new(db), "shop-1")
///     .confirmation(Arc::new(DialogGate::new(window)))
///     .notifications(Arc::new(ToastSink::new(window)))
///     .open()
///     .await?;
/// ```
pub struct BooksBuilder {
    store: Arc<dyn CollectionStore>,
    namespace: String,
    config: EngineConfig,
    confirmation: Option<Arc<dyn ConfirmationGate>>,
    notifications: Option<Arc<dyn NotificationSink>>,
}

impl BooksBuilder {
    pub fn new(store: Arc<dyn CollectionStore>, namespace: impl Into<String>) -> Self {
        BooksBuilder {
            store,
            namespace: namespace.into(),
            config: EngineConfig::default(),
            confirmation: None,
            notifications: None,
        }
    }

    /// Thresholds, retention and display settings. The namespace given to
    /// [`BooksBuilder::new`] wins over `config.activity`.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn confirmation(mut self, gate: Arc<dyn ConfirmationGate>) -> Self {
        self.confirmation = Some(gate);
        self
    }

    pub fn notifications(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifications = Some(sink);
        self
    }

    /// Loads every collection of the namespace.
    pub async fn open(self) -> EngineResult<Books> {
        let notifier = self.notifications.unwrap_or_else(|| Arc::new(NoOpNotifier));

        info!(namespace = %self.namespace, "Opening books");
        let state = match LedgerState::load(self.store.as_ref(), &self.namespace).await {
            Ok(state) => state,
            Err(err) => {
                error!(namespace = %self.namespace, error = %err, "Failed to open books");
                notifier.notify(err.to_notification());
                return Err(err);
            }
        };

        info!(
            namespace = %self.namespace,
            items = state.items.len(),
            sales = state.sales.len(),
            purchases = state.purchases.len(),
            "Books opened"
        );

        Ok(Books {
            namespace: self.namespace,
            store: self.store,
            confirmation: self.confirmation.unwrap_or_else(|| Arc::new(AutoConfirm)),
            notifier,
            config: self.config,
            state,
            pending_renames_unsaved: false,
        })
    }
}

// =============================================================================
// Books
// =============================================================================

/// The open books of one namespace.
pub struct Books {
    pub(crate) namespace: String,
    pub(crate) store: Arc<dyn CollectionStore>,
    pub(crate) confirmation: Arc<dyn ConfirmationGate>,
    pub(crate) notifier: Arc<dyn NotificationSink>,
    pub(crate) config: EngineConfig,
    pub(crate) state: LedgerState,
    /// Pending-rename markers changed but not yet written. They ride along
    /// with the next successful batch.
    pub(crate) pending_renames_unsaved: bool,
}

impl Books {
    /// Opens the SQLite database and namespace named by `config`, with the
    /// default collaborators.
    pub async fn open_with_config(config: EngineConfig) -> EngineResult<Books> {
        let db = Database::new(config.db_config()?).await?;
        let namespace = config.namespace().to_string();
        BooksBuilder::new(Arc::new(db), namespace)
            .config(config)
            .open()
            .await
    }

    // =========================================================================
    // Internals shared by every operation
    // =========================================================================

    /// Writes `collections` in one batch. On failure the state is replaced by
    /// `snapshot`.
    pub(crate) async fn persist(
        &mut self,
        snapshot: LedgerState,
        collections: &[Collection],
    ) -> EngineResult<()> {
        let mut collections = collections.to_vec();
        if self.pending_renames_unsaved && !collections.contains(&Collection::PendingRenames) {
            collections.push(Collection::PendingRenames);
        }

        let outcome = match self.state.encode(&collections) {
            Ok(writes) => self.store.save_batch(&self.namespace, &writes).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => {
                if collections.contains(&Collection::PendingRenames) {
                    self.pending_renames_unsaved = false;
                }
                Ok(())
            }
            Err(source) => {
                self.state = snapshot;
                let collections = describe(&collections);
                error!(
                    namespace = %self.namespace,
                    collections = %collections,
                    error = %source,
                    "Write failed, in-memory state restored"
                );
                Err(EngineError::PersistenceFailed {
                    collections,
                    source,
                })
            }
        }
    }

    pub(crate) async fn confirm(&self, request: ConfirmRequest) -> bool {
        let approved = self.confirmation.confirm(&request).await;
        if !approved {
            info!(title = %request.title, "Declined by user");
        }
        approved
    }

    /// Reports the outcome of a user-facing operation to the sink.
    pub(crate) fn finish<T>(
        &self,
        result: EngineResult<T>,
        on_success: impl FnOnce(&T) -> Option<String>,
    ) -> EngineResult<T> {
        match &result {
            Ok(value) => {
                if let Some(message) = on_success(value) {
                    self.notifier.notify(Notification::success(message));
                }
            }
            Err(err) if err.is_user_error() => {
                warn!(namespace = %self.namespace, error = %err, "Operation rejected");
                self.notifier.notify(err.to_notification());
            }
            Err(err) => {
                error!(namespace = %self.namespace, error = %err, "Operation failed");
                self.notifier.notify(err.to_notification());
            }
        }
        result
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn items(&self) -> &ItemRepository {
        &self.state.items
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.state.items.get(id)
    }

    pub fn parties(&self, kind: PartyKind) -> &PartyRepository {
        self.state.parties(kind)
    }

    pub fn party(&self, kind: PartyKind, id: &str) -> Option<&Party> {
        self.state.parties(kind).get(id)
    }

    pub fn documents(&self, kind: DocumentKind) -> &[Document] {
        self.state.book(kind).as_slice()
    }

    pub fn document(&self, kind: DocumentKind, id: &str) -> Option<&Document> {
        self.state.book(kind).get(id)
    }

    /// Sequence number the next created document of `kind` will get.
    pub fn next_sequence(&self, kind: DocumentKind) -> u64 {
        self.state.book(kind).next_sequence()
    }

    pub fn cash_entries(&self, kind: CashKind) -> &[CashEntry] {
        self.state.cash(kind).as_slice()
    }

    pub fn cash_total(&self, kind: CashKind) -> Money {
        self.state.cash(kind).total()
    }

    pub fn trash(&self) -> &TombstoneStore {
        &self.state.trash
    }

    pub fn pending_renames(&self) -> &[PendingRename] {
        &self.state.pending_renames
    }

    /// Current stock of an item.
    pub fn stock_of(&self, item_id: &str) -> Option<i64> {
        self.state.items.stock_of(item_id)
    }

    /// Items at or below the configured threshold but not out.
    pub fn low_stock(&self) -> Vec<&Item> {
        self.state
            .items
            .low_stock(self.config.inventory.low_stock_threshold)
    }

    pub fn out_of_stock(&self) -> Vec<&Item> {
        self.state.items.out_of_stock()
    }

    /// Σ stock × cost over all items.
    pub fn stock_value(&self) -> Money {
        self.state.items.stock_value()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
