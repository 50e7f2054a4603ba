//! # Party/Item Repository
//!
//! In-memory id → record maps for items, customers and suppliers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Registry<T>                                                            │
//! │                                                                         │
//! │   records: Vec<T>   insertion order = persisted order                   │
//! │                                                                         │
//! │   get(id)              exact id                                         │
//! │   find_by_name(name)   case-insensitive, trimmed                        │
//! │   next_code("IT")      highest numeric suffix + 1 → IT007               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The registry is owned by the engine's composition root and persisted as a
//! whole collection snapshot.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{EntityType, Item, Party};

/// A record that can live in a [`Registry`].
pub trait Record {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn code(&self) -> &str;
}

impl Record for Item {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn code(&self) -> &str {
        &self.code
    }
}

impl Record for Party {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn code(&self) -> &str {
        &self.code
    }
}

/// Ordered collection of records with unique ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry<T> {
    records: Vec<T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            records: Vec::new(),
        }
    }
}

/// Item repository.
pub type ItemRepository = Registry<Item>;

/// Customer or supplier repository.
pub type PartyRepository = Registry<Party>;

impl<T: Record> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a loaded collection, rejecting duplicate ids.
    pub fn from_records(entity: EntityType, records: Vec<T>) -> CoreResult<Self> {
        let mut registry = Registry::new();
        for record in records {
            registry.insert(entity, record)?;
        }
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.records.iter_mut().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Case-insensitive lookup by name.
    pub fn find_by_name(&self, name: &str) -> Option<&T> {
        let wanted = name.trim().to_lowercase();
        self.records
            .iter()
            .find(|r| r.name().trim().to_lowercase() == wanted)
    }

    /// Fails if `name` is already used by a record other than `except_id`.
    pub fn ensure_name_available(&self, name: &str, except_id: Option<&str>) -> CoreResult<()> {
        match self.find_by_name(name) {
            Some(existing) if Some(existing.id()) != except_id => {
                Err(ValidationError::duplicate("name", name.trim()).into())
            }
            _ => Ok(()),
        }
    }

    /// Appends a record. Ids are unique.
    pub fn insert(&mut self, entity: EntityType, record: T) -> CoreResult<()> {
        if self.contains(record.id()) {
            return Err(CoreError::DuplicateId {
                entity,
                id: record.id().to_string(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Removes a record, returning it.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.records.iter().position(|r| r.id() == id)?;
        Some(self.records.remove(index))
    }

    /// Next free business code for `prefix`, zero-padded to three digits.
    ///
    /// ```rust
    /// use daftar_core::repository::ItemRepository;
    ///
    /// assert_eq!(ItemRepository::new().next_code("IT"), "IT001");
    /// ```
    pub fn next_code(&self, prefix: &str) -> String {
        let highest = self
            .records
            .iter()
            .filter_map(|r| r.code().strip_prefix(prefix))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("{}{:03}", prefix, highest + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// =============================================================================
// Item queries
// =============================================================================

impl Registry<Item> {
    /// Stock on hand for `item_id`.
    pub fn stock_of(&self, item_id: &str) -> Option<i64> {
        self.get(item_id).map(|item| item.stock)
    }

    /// Items running low: `0 < stock <= threshold`.
    pub fn low_stock(&self, threshold: i64) -> Vec<&Item> {
        self.records
            .iter()
            .filter(|item| item.stock > 0 && item.stock <= threshold)
            .collect()
    }

    /// Items with nothing on hand.
    pub fn out_of_stock(&self) -> Vec<&Item> {
        self.records.iter().filter(|item| item.stock <= 0).collect()
    }

    /// Σ stock × cost over all items.
    pub fn stock_value(&self) -> Money {
        self.records.iter().map(Item::stock_value).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
