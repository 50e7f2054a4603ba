//! # Soft-Delete Tombstone Store
//!
//! Recovery area for deleted items, customers and suppliers.
//!
//! ## Lifecycle
//! ```text
//! ┌──────────────┐  soft_delete   ┌──────────────┐  restore   ┌──────────────┐
//! │ Active repo  │ ─────────────► │  Tombstone   │ ─────────► │ Active repo  │
//! │   (record)   │                │ payload JSON │            │ (same record)│
//! └──────────────┘                │  deleted_at  │            └──────────────┘
//!                                 └──────┬───────┘
//!                                        │ purge_expired (external schedule)
//!                                        ▼
//!                                      gone
//! ```
//!
//! The payload is the full serialized record, so a restore yields a record
//! equal to the one deleted.

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::EntityType;

/// A soft-deleted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tombstone {
    /// Tombstone id (not the record id).
    pub id: String,
    pub entity_type: EntityType,
    /// Id of the deleted record.
    pub record_id: String,
    /// Name of the deleted record, for listing.
    pub record_name: String,
    pub payload: serde_json::Value,
    pub deleted_at: DateTime<Utc>,
}

impl Tombstone {
    /// Decodes the payload back into its record type.
    pub fn decode<T: DeserializeOwned>(&self) -> CoreResult<T> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| CoreError::malformed(self.entity_type.to_string(), e))
    }

    /// True once the tombstone is older than `retention`.
    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        now - self.deleted_at > retention
    }
}

/// All tombstones of one namespace, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TombstoneStore {
    entries: Vec<Tombstone>,
}

impl TombstoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Tombstone>) -> Self {
        TombstoneStore { entries }
    }

    /// Copies `record` into the store. Removing it from its repository is the
    /// caller's job.
    pub fn soft_delete<T: Serialize>(
        &mut self,
        entity_type: EntityType,
        record_id: &str,
        record_name: &str,
        record: &T,
        now: DateTime<Utc>,
    ) -> CoreResult<&Tombstone> {
        let payload = serde_json::to_value(record)
            .map_err(|e| CoreError::malformed(entity_type.to_string(), e))?;

        self.entries.push(Tombstone {
            id: Uuid::new_v4().to_string(),
            entity_type,
            record_id: record_id.to_string(),
            record_name: record_name.to_string(),
            payload,
            deleted_at: now,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn get(&self, tombstone_id: &str) -> Option<&Tombstone> {
        self.entries.iter().find(|t| t.id == tombstone_id)
    }

    /// Looks a tombstone up, failing with `TombstoneNotFound`.
    pub fn require(&self, tombstone_id: &str) -> CoreResult<&Tombstone> {
        self.get(tombstone_id)
            .ok_or_else(|| CoreError::TombstoneNotFound(tombstone_id.to_string()))
    }

    /// Removes a tombstone, handing it back for restoration.
    pub fn take(&mut self, tombstone_id: &str) -> CoreResult<Tombstone> {
        let index = self
            .entries
            .iter()
            .position(|t| t.id == tombstone_id)
            .ok_or_else(|| CoreError::TombstoneNotFound(tombstone_id.to_string()))?;
        Ok(self.entries.remove(index))
    }

    /// Tombstones of one entity type.
    pub fn of_type(&self, entity_type: EntityType) -> impl Iterator<Item = &Tombstone> {
        self.entries
            .iter()
            .filter(move |t| t.entity_type == entity_type)
    }

    /// Drops tombstones older than `retention`, returning how many went.
    pub fn purge_expired(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|t| !t.is_expired(now, retention));
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tombstone> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
