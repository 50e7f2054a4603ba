//! # Ledger State
//!
//! Every collection of one namespace, held in memory by [`Books`](crate::Books).
//!
//! ```text
//!  collection    stored as                   in memory
//!  ──────────    ─────────────────────────   ─────────────────────
//!  items         [Item, ..]                  ItemRepository
//!  customers     [Party, ..]                 PartyRepository
//!  suppliers     [Party, ..]                 PartyRepository
//!  sales         [Document, ..]              DocumentBook ─┐
//!  purchases     [Document, ..]              DocumentBook ─┤ counters
//!  sequences     {nextSale, nextPurchase}    ◄─────────────┘
//!  expenses      [CashEntry, ..]             CashBook
//!  revenues      [CashEntry, ..]             CashBook
//!  trash         [Tombstone, ..]             TombstoneStore
//!  pendingRenames [PendingRename, ..]        Vec<PendingRename>
//! ```
//!
//! The state is cloned as a snapshot before each mutation and put back
//! wholesale if the write fails.

use std::fmt;

use daftar_core::{
    rename_cascade, CashBook, CashKind, Document, DocumentBook, DocumentKind, EntityType,
    ItemRepository, PartyKind, PartyRepository, Registry, Sequences, TombstoneStore,
};
use daftar_db::{CollectionStore, CollectionWrite, DbError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::books::PendingRename;
use crate::error::{EngineError, EngineResult};

// =============================================================================
// Collection names
// =============================================================================

/// A persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Items,
    Customers,
    Suppliers,
    Sales,
    Purchases,
    Sequences,
    Expenses,
    Revenues,
    Trash,
    PendingRenames,
}

impl Collection {
    pub const ALL: [Collection; 10] = [
        Collection::Items,
        Collection::Customers,
        Collection::Suppliers,
        Collection::Sales,
        Collection::Purchases,
        Collection::Sequences,
        Collection::Expenses,
        Collection::Revenues,
        Collection::Trash,
        Collection::PendingRenames,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Collection::Items => "items",
            Collection::Customers => "customers",
            Collection::Suppliers => "suppliers",
            Collection::Sales => "sales",
            Collection::Purchases => "purchases",
            Collection::Sequences => "sequences",
            Collection::Expenses => "expenses",
            Collection::Revenues => "revenues",
            Collection::Trash => "trash",
            Collection::PendingRenames => "pendingRenames",
        }
    }

    pub const fn documents(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Sale => Collection::Sales,
            DocumentKind::Purchase => Collection::Purchases,
        }
    }

    pub const fn parties(kind: PartyKind) -> Self {
        match kind {
            PartyKind::Customer => Collection::Customers,
            PartyKind::Supplier => Collection::Suppliers,
        }
    }

    pub const fn cash(kind: CashKind) -> Self {
        match kind {
            CashKind::Expense => Collection::Expenses,
            CashKind::Revenue => Collection::Revenues,
        }
    }

    /// Repository collection holding records of `entity_type`.
    pub const fn records(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::Item => Collection::Items,
            EntityType::Customer => Collection::Customers,
            EntityType::Supplier => Collection::Suppliers,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `"sales, items"`
pub(crate) fn describe(collections: &[Collection]) -> String {
    collections
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Ledger State
// =============================================================================

#[derive(Debug, Clone)]
pub struct LedgerState {
    pub items: ItemRepository,
    pub customers: PartyRepository,
    pub suppliers: PartyRepository,
    pub sales: DocumentBook,
    pub purchases: DocumentBook,
    pub expenses: CashBook,
    pub revenues: CashBook,
    pub trash: TombstoneStore,
    pub pending_renames: Vec<PendingRename>,
}

impl Default for LedgerState {
    fn default() -> Self {
        LedgerState {
            items: ItemRepository::new(),
            customers: PartyRepository::new(),
            suppliers: PartyRepository::new(),
            sales: DocumentBook::new(DocumentKind::Sale),
            purchases: DocumentBook::new(DocumentKind::Purchase),
            expenses: CashBook::new(CashKind::Expense),
            revenues: CashBook::new(CashKind::Revenue),
            trash: TombstoneStore::new(),
            pending_renames: Vec::new(),
        }
    }
}

impl LedgerState {
    /// Loads every collection of `namespace`. Missing collections start empty.
    pub async fn load(store: &dyn CollectionStore, namespace: &str) -> EngineResult<Self> {
        let items = load_vec(store, namespace, Collection::Items).await?;
        let customers = load_vec(store, namespace, Collection::Customers).await?;
        let suppliers = load_vec(store, namespace, Collection::Suppliers).await?;
        let sales = load_vec(store, namespace, Collection::Sales).await?;
        let purchases = load_vec(store, namespace, Collection::Purchases).await?;
        let expenses = load_vec(store, namespace, Collection::Expenses).await?;
        let revenues = load_vec(store, namespace, Collection::Revenues).await?;
        let trash = load_vec(store, namespace, Collection::Trash).await?;
        let pending_renames = load_vec(store, namespace, Collection::PendingRenames).await?;
        let sequences: Sequences = load_value(store, namespace, Collection::Sequences)
            .await?
            .unwrap_or_default();

        Ok(LedgerState {
            items: restore_registry(Collection::Items, EntityType::Item, items)?,
            customers: restore_registry(Collection::Customers, EntityType::Customer, customers)?,
            suppliers: restore_registry(Collection::Suppliers, EntityType::Supplier, suppliers)?,
            sales: restore_book(DocumentKind::Sale, sales, &sequences)?,
            purchases: restore_book(DocumentKind::Purchase, purchases, &sequences)?,
            expenses: CashBook::with_entries(CashKind::Expense, expenses),
            revenues: CashBook::with_entries(CashKind::Revenue, revenues),
            trash: TombstoneStore::from_entries(trash),
            pending_renames,
        })
    }

    pub fn book(&self, kind: DocumentKind) -> &DocumentBook {
        match kind {
            DocumentKind::Sale => &self.sales,
            DocumentKind::Purchase => &self.purchases,
        }
    }

    pub fn book_mut(&mut self, kind: DocumentKind) -> &mut DocumentBook {
        match kind {
            DocumentKind::Sale => &mut self.sales,
            DocumentKind::Purchase => &mut self.purchases,
        }
    }

    pub fn parties(&self, kind: PartyKind) -> &PartyRepository {
        match kind {
            PartyKind::Customer => &self.customers,
            PartyKind::Supplier => &self.suppliers,
        }
    }

    pub fn parties_mut(&mut self, kind: PartyKind) -> &mut PartyRepository {
        match kind {
            PartyKind::Customer => &mut self.customers,
            PartyKind::Supplier => &mut self.suppliers,
        }
    }

    pub fn cash(&self, kind: CashKind) -> &CashBook {
        match kind {
            CashKind::Expense => &self.expenses,
            CashKind::Revenue => &self.revenues,
        }
    }

    pub fn cash_mut(&mut self, kind: CashKind) -> &mut CashBook {
        match kind {
            CashKind::Expense => &mut self.expenses,
            CashKind::Revenue => &mut self.revenues,
        }
    }

    pub fn sequences(&self) -> Sequences {
        Sequences {
            next_sale: self.sales.next_sequence(),
            next_purchase: self.purchases.next_sequence(),
        }
    }

    /// Runs the rename cascade over the documents that denormalize
    /// `entity_type`. Returns the collections touched and the document count.
    pub fn cascade_rename(
        &mut self,
        entity_type: EntityType,
        id: &str,
        old_name: &str,
        new_name: &str,
    ) -> (Vec<Collection>, usize) {
        let mut touched = Vec::new();
        let mut count = 0;

        let kinds: &[DocumentKind] = match entity_type {
            EntityType::Item => &[DocumentKind::Sale, DocumentKind::Purchase],
            EntityType::Customer => &[DocumentKind::Sale],
            EntityType::Supplier => &[DocumentKind::Purchase],
        };

        for kind in kinds {
            let renamed = rename_cascade(
                self.book_mut(*kind).iter_mut(),
                entity_type,
                id,
                old_name,
                new_name,
            );
            if renamed > 0 {
                touched.push(Collection::documents(*kind));
                count += renamed;
            }
        }

        (touched, count)
    }

    /// Serializes the named collections for one batch write.
    pub fn encode(&self, collections: &[Collection]) -> Result<Vec<CollectionWrite>, DbError> {
        collections
            .iter()
            .map(|collection| {
                self.encode_one(*collection)
                    .map(|payload| CollectionWrite::new(collection.name(), payload))
                    .map_err(|e| DbError::serialization(collection.name(), e))
            })
            .collect()
    }

    fn encode_one(&self, collection: Collection) -> Result<Value, serde_json::Error> {
        match collection {
            Collection::Items => serde_json::to_value(&self.items),
            Collection::Customers => serde_json::to_value(&self.customers),
            Collection::Suppliers => serde_json::to_value(&self.suppliers),
            Collection::Sales => serde_json::to_value(self.sales.as_slice()),
            Collection::Purchases => serde_json::to_value(self.purchases.as_slice()),
            Collection::Sequences => serde_json::to_value(self.sequences()),
            Collection::Expenses => serde_json::to_value(self.expenses.as_slice()),
            Collection::Revenues => serde_json::to_value(self.revenues.as_slice()),
            Collection::Trash => serde_json::to_value(&self.trash),
            Collection::PendingRenames => serde_json::to_value(&self.pending_renames),
        }
    }
}

// =============================================================================
// Loading helpers
// =============================================================================

async fn load_value<T: DeserializeOwned>(
    store: &dyn CollectionStore,
    namespace: &str,
    collection: Collection,
) -> EngineResult<Option<T>> {
    let value = match store.load(namespace, collection.name()).await {
        Ok(value) => value,
        Err(DbError::Serialization { reason, .. }) => return Err(corrupt(collection, reason)),
        Err(err) => return Err(EngineError::Storage(err)),
    };

    match value {
        None | Some(Value::Null) => {
            debug!(collection = %collection, "Collection not stored yet");
            Ok(None)
        }
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| corrupt(collection, e)),
    }
}

async fn load_vec<T: DeserializeOwned>(
    store: &dyn CollectionStore,
    namespace: &str,
    collection: Collection,
) -> EngineResult<Vec<T>> {
    Ok(load_value(store, namespace, collection).await?.unwrap_or_default())
}

fn restore_registry<T: daftar_core::Record>(
    collection: Collection,
    entity: EntityType,
    records: Vec<T>,
) -> EngineResult<Registry<T>> {
    Registry::from_records(entity, records).map_err(|e| corrupt(collection, e))
}

fn restore_book(
    kind: DocumentKind,
    documents: Vec<Document>,
    sequences: &Sequences,
) -> EngineResult<DocumentBook> {
    DocumentBook::restore(kind, documents, sequences.next_for(kind))
        .map_err(|e| corrupt(Collection::documents(kind), e))
}

fn corrupt(collection: Collection, reason: impl ToString) -> EngineError {
    let reason = reason.to_string();
    error!(collection = %collection, reason = %reason, "Stored collection is corrupt");
    EngineError::Corrupt {
        collection: collection.name().to_string(),
        reason,
    }
}
