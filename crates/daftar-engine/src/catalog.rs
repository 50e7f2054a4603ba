//! Items, customers and suppliers: create, update with rename propagation,
//! soft delete and restore.
//!
//! An update that changes a name rewrites the name snapshots of every
//! document that references the record, in the same batch as the repository.
//! If that batch fails, nothing changes and a [`PendingRename`] is stored until
//! [`Books::retry_pending_renames`] gets it through, across restarts too.

use chrono::{DateTime, Utc};
use daftar_core::{
    CoreError, CoreResult, EntityType, Item, ItemInput, Party, PartyInput, PartyKind, Tombstone,
    ITEM_CODE_PREFIX,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::books::{Books, PendingRename};
use crate::error::EngineResult;
use crate::ports::ConfirmRequest;
use crate::state::{Collection, LedgerState};

/// Outcome of an update: the stored record and how many documents had their
/// name snapshot rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate<T> {
    pub record: T,
    pub renamed_documents: usize,
}

impl Books {
    // =========================================================================
    // Create
    // =========================================================================

    /// Adds an item with the next `IT` code. `opening_stock` becomes its
    /// stock.
    pub async fn add_item(&mut self, input: ItemInput) -> EngineResult<Item> {
        let result = self.add_item_inner(input).await;
        self.finish(result, |item| Some(format!("Item {} added", item.name)))
    }

    async fn add_item_inner(&mut self, input: ItemInput) -> EngineResult<Item> {
        let name = input.validate()?;
        self.state.items.ensure_name_available(&name, None)?;

        let code = self.state.items.next_code(ITEM_CODE_PREFIX);
        let item = input.into_item(Uuid::new_v4().to_string(), code)?;

        let snapshot = self.state.clone();
        self.state.items.insert(EntityType::Item, item.clone())?;
        self.persist(snapshot, &[Collection::Items]).await?;

        info!(item_id = %item.id, code = %item.code, stock = item.stock, "Item added");
        Ok(item)
    }

    /// Adds a customer or supplier with the next `CU`/`SU` code.
    pub async fn add_party(&mut self, kind: PartyKind, input: PartyInput) -> EngineResult<Party> {
        let result = self.add_party_inner(kind, input).await;
        self.finish(result, |party| Some(format!("{} {} added", kind, party.name)))
    }

    async fn add_party_inner(&mut self, kind: PartyKind, input: PartyInput) -> EngineResult<Party> {
        let name = input.validate()?;
        let parties = self.state.parties(kind);
        parties.ensure_name_available(&name, None)?;

        let code = parties.next_code(kind.code_prefix());
        let party = input.into_party(Uuid::new_v4().to_string(), code)?;

        let snapshot = self.state.clone();
        self.state
            .parties_mut(kind)
            .insert(kind.entity_type(), party.clone())?;
        self.persist(snapshot, &[Collection::parties(kind)]).await?;

        info!(kind = %kind, party_id = %party.id, code = %party.code, "Party added");
        Ok(party)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Updates name, cost and price. Stock is never touched here.
    pub async fn update_item(
        &mut self,
        id: &str,
        input: ItemInput,
    ) -> EngineResult<RecordUpdate<Item>> {
        let result = self.update_item_inner(id, input).await;
        self.finish(result, |update| {
            Some(update_message(EntityType::Item, &update.record.name, update.renamed_documents))
        })
    }

    async fn update_item_inner(
        &mut self,
        id: &str,
        input: ItemInput,
    ) -> EngineResult<RecordUpdate<Item>> {
        let current = self
            .state
            .items
            .get(id)
            .ok_or_else(|| CoreError::ItemNotFound(id.to_string()))?
            .clone();
        let name = input.validate()?;
        self.state.items.ensure_name_available(&name, Some(id))?;

        let mut updated = current.clone();
        input.apply_to(&mut updated)?;

        let stored = updated.clone();
        let renamed_documents = self
            .save_record_update(EntityType::Item, id, &current.name, &updated.name, |state| {
                if let Some(item) = state.items.get_mut(id) {
                    *item = stored;
                }
            })
            .await?;

        Ok(RecordUpdate {
            record: updated,
            renamed_documents,
        })
    }

    /// Updates every field of a customer or supplier.
    pub async fn update_party(
        &mut self,
        kind: PartyKind,
        id: &str,
        input: PartyInput,
    ) -> EngineResult<RecordUpdate<Party>> {
        let result = self.update_party_inner(kind, id, input).await;
        self.finish(result, |update| {
            Some(update_message(
                kind.entity_type(),
                &update.record.name,
                update.renamed_documents,
            ))
        })
    }

    async fn update_party_inner(
        &mut self,
        kind: PartyKind,
        id: &str,
        input: PartyInput,
    ) -> EngineResult<RecordUpdate<Party>> {
        let parties = self.state.parties(kind);
        let current = parties
            .get(id)
            .ok_or_else(|| CoreError::PartyNotFound {
                kind,
                id: id.to_string(),
            })?
            .clone();
        let name = input.validate()?;
        parties.ensure_name_available(&name, Some(id))?;

        let mut updated = current.clone();
        input.apply_to(&mut updated)?;

        let stored = updated.clone();
        let renamed_documents = self
            .save_record_update(kind.entity_type(), id, &current.name, &updated.name, |state| {
                if let Some(party) = state.parties_mut(kind).get_mut(id) {
                    *party = stored;
                }
            })
            .await?;

        Ok(RecordUpdate {
            record: updated,
            renamed_documents,
        })
    }

    /// Stores a validated record update, cascading a name change into the
    /// documents. Returns the number of documents renamed.
    async fn save_record_update(
        &mut self,
        entity_type: EntityType,
        id: &str,
        old_name: &str,
        new_name: &str,
        store_record: impl FnOnce(&mut LedgerState),
    ) -> EngineResult<usize> {
        let snapshot = self.state.clone();
        store_record(&mut self.state);

        let mut collections = vec![Collection::records(entity_type)];
        let renaming = old_name != new_name;
        let mut renamed = 0;
        if renaming {
            let (touched, count) = self.state.cascade_rename(entity_type, id, old_name, new_name);
            collections.extend(touched);
            renamed = count;
            if drop_marker(&mut self.state, id) {
                collections.push(Collection::PendingRenames);
            }
        }

        if let Err(err) = self.persist(snapshot, &collections).await {
            if renaming {
                self.mark_pending_rename(entity_type, id, old_name, new_name)
                    .await;
            }
            return Err(err);
        }

        if renaming {
            info!(
                entity_type = %entity_type,
                record_id = %id,
                old_name = %old_name,
                new_name = %new_name,
                documents = renamed,
                "Record renamed"
            );
        }
        Ok(renamed)
    }

    /// Records a failed rename. The marker is written on its own right away;
    /// if that fails too it goes out with the next successful batch.
    async fn mark_pending_rename(
        &mut self,
        entity_type: EntityType,
        id: &str,
        old_name: &str,
        new_name: &str,
    ) {
        warn!(
            entity_type = %entity_type,
            record_id = %id,
            new_name = %new_name,
            "Rename not saved, kept as pending"
        );
        drop_marker(&mut self.state, id);
        self.state.pending_renames.push(PendingRename {
            entity_type,
            record_id: id.to_string(),
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            failed_at: Utc::now(),
        });
        self.save_pending_renames().await;
    }

    async fn save_pending_renames(&mut self) {
        let saved = match self.state.encode(&[Collection::PendingRenames]) {
            Ok(writes) => self.store.save_batch(&self.namespace, &writes).await,
            Err(err) => Err(err),
        };
        match saved {
            Ok(()) => self.pending_renames_unsaved = false,
            Err(err) => {
                warn!(
                    namespace = %self.namespace,
                    error = %err,
                    "Pending renames not saved, retrying with the next write"
                );
                self.pending_renames_unsaved = true;
            }
        }
    }

    /// Re-applies renames whose write failed, name and cascade only.
    ///
    /// Stops at the first write failure and keeps that marker and the ones
    /// after it. Markers for records that are gone, or that were renamed by
    /// other means since, are dropped. Returns how many renames went through.
    pub async fn retry_pending_renames(&mut self) -> EngineResult<usize> {
        let result = self.retry_pending_renames_inner().await;
        self.finish(result, |applied| {
            (*applied > 0).then(|| format!("{} pending rename(s) saved", applied))
        })
    }

    async fn retry_pending_renames_inner(&mut self) -> EngineResult<usize> {
        let pending = self.state.pending_renames.clone();
        let mut applied = 0;

        for marker in &pending {
            if current_name(&self.state, marker.entity_type, &marker.record_id).as_deref()
                != Some(marker.old_name.as_str())
            {
                warn!(record_id = %marker.record_id, "Pending rename no longer applies, dropped");
                drop_marker(&mut self.state, &marker.record_id);
                self.pending_renames_unsaved = true;
                continue;
            }

            let snapshot = self.state.clone();
            if let Err(err) = rename_record(&mut self.state, marker) {
                self.state = snapshot;
                return Err(err.into());
            }

            let mut collections = vec![Collection::records(marker.entity_type)];
            let (touched, _) = self.state.cascade_rename(
                marker.entity_type,
                &marker.record_id,
                &marker.old_name,
                &marker.new_name,
            );
            collections.extend(touched);
            drop_marker(&mut self.state, &marker.record_id);
            collections.push(Collection::PendingRenames);

            // On failure the snapshot brings this marker and the later ones back.
            self.persist(snapshot, &collections).await?;
            applied += 1;
        }

        if self.pending_renames_unsaved {
            self.save_pending_renames().await;
        }
        Ok(applied)
    }

    // =========================================================================
    // Soft delete / restore
    // =========================================================================

    /// Moves an item to the trash after confirmation. Documents keep their
    /// lines for it. `Ok(None)` when the user declines.
    pub async fn soft_delete_item(&mut self, id: &str) -> EngineResult<Option<Tombstone>> {
        let result = self.soft_delete_inner(EntityType::Item, id).await;
        self.finish(result, trashed_message)
    }

    /// Moves a customer or supplier to the trash after confirmation.
    pub async fn soft_delete_party(
        &mut self,
        kind: PartyKind,
        id: &str,
    ) -> EngineResult<Option<Tombstone>> {
        let result = self.soft_delete_inner(kind.entity_type(), id).await;
        self.finish(result, trashed_message)
    }

    async fn soft_delete_inner(
        &mut self,
        entity_type: EntityType,
        id: &str,
    ) -> EngineResult<Option<Tombstone>> {
        let name = current_name(&self.state, entity_type, id).ok_or_else(|| not_found(entity_type, id))?;

        if !self.confirm(ConfirmRequest::delete(entity_type, &name)).await {
            return Ok(None);
        }

        let snapshot = self.state.clone();
        let now = Utc::now();
        let tombstone = match entity_type.party_kind() {
            None => match self.state.items.remove(id) {
                Some(item) => self
                    .state
                    .trash
                    .soft_delete(entity_type, id, &name, &item, now)
                    .cloned(),
                None => Err(not_found(entity_type, id)),
            },
            Some(kind) => match self.state.parties_mut(kind).remove(id) {
                Some(party) => self
                    .state
                    .trash
                    .soft_delete(entity_type, id, &name, &party, now)
                    .cloned(),
                None => Err(not_found(entity_type, id)),
            },
        };
        let tombstone = match tombstone {
            Ok(tombstone) => tombstone,
            Err(err) => {
                self.state = snapshot;
                return Err(err.into());
            }
        };

        self.persist(
            snapshot,
            &[Collection::records(entity_type), Collection::Trash],
        )
        .await?;

        info!(entity_type = %entity_type, record_id = %id, tombstone_id = %tombstone.id, "Moved to trash");
        Ok(Some(tombstone))
    }

    /// Puts a trashed record back into its repository exactly as it was.
    ///
    /// Fails if an active record now has the same id or name; the tombstone
    /// stays in the trash.
    pub async fn restore(&mut self, tombstone_id: &str) -> EngineResult<Tombstone> {
        let result = self.restore_inner(tombstone_id).await;
        self.finish(result, |tombstone| {
            Some(format!("{} {} restored", tombstone.entity_type, tombstone.record_name))
        })
    }

    async fn restore_inner(&mut self, tombstone_id: &str) -> EngineResult<Tombstone> {
        let snapshot = self.state.clone();
        let tombstone = self.state.trash.take(tombstone_id)?;

        if let Err(err) = reinsert(&mut self.state, &tombstone) {
            self.state = snapshot;
            return Err(err.into());
        }

        self.persist(
            snapshot,
            &[Collection::records(tombstone.entity_type), Collection::Trash],
        )
        .await?;

        info!(
            entity_type = %tombstone.entity_type,
            record_id = %tombstone.record_id,
            "Restored from trash"
        );
        Ok(tombstone)
    }

    /// Drops tombstones older than the configured retention. Meant for an
    /// external scheduler.
    pub async fn purge_expired(&mut self, now: DateTime<Utc>) -> EngineResult<usize> {
        let result = self.purge_expired_inner(now).await;
        self.finish(result, |_| None)
    }

    async fn purge_expired_inner(&mut self, now: DateTime<Utc>) -> EngineResult<usize> {
        let snapshot = self.state.clone();
        let purged = self.state.trash.purge_expired(now, self.config.retention());
        if purged == 0 {
            return Ok(0);
        }

        self.persist(snapshot, &[Collection::Trash]).await?;
        info!(purged, retention_days = self.config.trash.retention_days, "Trash purged");
        Ok(purged)
    }
}

/// Removes the marker for `id`. True when there was one.
fn drop_marker(state: &mut LedgerState, id: &str) -> bool {
    let before = state.pending_renames.len();
    state.pending_renames.retain(|p| p.record_id != id);
    state.pending_renames.len() != before
}

fn current_name(state: &LedgerState, entity_type: EntityType, id: &str) -> Option<String> {
    match entity_type.party_kind() {
        None => state.items.get(id).map(|item| item.name.clone()),
        Some(kind) => state.parties(kind).get(id).map(|party| party.name.clone()),
    }
}

fn not_found(entity_type: EntityType, id: &str) -> CoreError {
    match entity_type.party_kind() {
        None => CoreError::ItemNotFound(id.to_string()),
        Some(kind) => CoreError::PartyNotFound {
            kind,
            id: id.to_string(),
        },
    }
}

/// Sets the record's name to the marker's new name, uniqueness checked.
fn rename_record(state: &mut LedgerState, marker: &PendingRename) -> CoreResult<()> {
    let id = marker.record_id.as_str();
    match marker.entity_type.party_kind() {
        None => {
            state.items.ensure_name_available(&marker.new_name, Some(id))?;
            let item = state
                .items
                .get_mut(id)
                .ok_or_else(|| not_found(marker.entity_type, id))?;
            item.name = marker.new_name.clone();
        }
        Some(kind) => {
            let parties = state.parties_mut(kind);
            parties.ensure_name_available(&marker.new_name, Some(id))?;
            let party = parties
                .get_mut(id)
                .ok_or_else(|| not_found(marker.entity_type, id))?;
            party.name = marker.new_name.clone();
        }
    }
    Ok(())
}

fn reinsert(state: &mut LedgerState, tombstone: &Tombstone) -> CoreResult<()> {
    match tombstone.entity_type.party_kind() {
        None => {
            let item: Item = tombstone.decode()?;
            state.items.ensure_name_available(&item.name, None)?;
            state.items.insert(EntityType::Item, item)
        }
        Some(kind) => {
            let party: Party = tombstone.decode()?;
            let parties = state.parties_mut(kind);
            parties.ensure_name_available(&party.name, None)?;
            parties.insert(kind.entity_type(), party)
        }
    }
}

fn update_message(entity_type: EntityType, name: &str, renamed_documents: usize) -> String {
    if renamed_documents > 0 {
        format!(
            "{} {} updated, {} document(s) renamed",
            entity_type, name, renamed_documents
        )
    } else {
        format!("{} {} updated", entity_type, name)
    }
}

fn trashed_message(tombstone: &Option<Tombstone>) -> Option<String> {
    tombstone
        .as_ref()
        .map(|t| format!("{} {} moved to trash", t.entity_type, t.record_name))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::ports::NotifyLevel;
    use crate::testing::*;
    use daftar_core::{DocumentKind, Money, ValidationError};

    fn widget_input(name: &str) -> ItemInput {
        ItemInput {
            name: name.to_string(),
            cost: Money::from_major(30),
            price: Money::from_major(55),
            opening_stock: 99,
        }
    }

    fn party_input(name: &str) -> PartyInput {
        PartyInput {
            name: name.to_string(),
            phone: Some("0501234567".to_string()),
            ..PartyInput::default()
        }
    }

    #[tokio::test]
    async fn test_codes_follow_highest_suffix() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;

        let first = add_item(&mut books, "Widget", 1).await;
        let second = add_item(&mut books, "Bolt", 1).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let acme = add_party(&mut books, PartyKind::Supplier, "Acme").await;

        assert_eq!(first.code, "IT001");
        assert_eq!(second.code, "IT002");
        assert_eq!(ali.code, "CU001");
        assert_eq!(acme.code, "SU001");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_case_insensitively() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        add_widget(&mut books, 1).await;

        let err = books.add_item(widget_input("  WIDGET ")).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::Core(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
        assert_eq!(books.items().len(), 1);
        assert_eq!(harness.notifier.last().unwrap().level, NotifyLevel::Warning);
    }

    #[tokio::test]
    async fn test_same_name_allowed_across_party_kinds() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        add_party(&mut books, PartyKind::Customer, "Noor").await;

        let supplier = books
            .add_party(PartyKind::Supplier, party_input("Noor"))
            .await
            .unwrap();

        assert_eq!(supplier.phone.as_deref(), Some("0501234567"));
    }

    #[tokio::test]
    async fn test_update_item_keeps_stock() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;

        let update = books
            .update_item(&widget.id, widget_input("Widget"))
            .await
            .unwrap();

        assert_eq!(update.record.stock, 10);
        assert_eq!(update.record.price, Money::from_major(55));
        assert_eq!(update.renamed_documents, 0);
        assert_eq!(books.stock_of(&widget.id), Some(10));
    }

    #[tokio::test]
    async fn test_item_rename_reaches_sales_and_purchases() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let bolt = add_item(&mut books, "Bolt", 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let acme = add_party(&mut books, PartyKind::Supplier, "Acme").await;
        let sale = sell(&mut books, &ali, &widget, 1).await;
        let purchase = buy(&mut books, &acme, &widget, 1).await;
        sell(&mut books, &ali, &bolt, 1).await;

        let update = books
            .update_item(&widget.id, widget_input("Widget Pro"))
            .await
            .unwrap();

        assert_eq!(update.renamed_documents, 2);
        let sale = books.document(DocumentKind::Sale, &sale.id).unwrap();
        let purchase = books.document(DocumentKind::Purchase, &purchase.id).unwrap();
        assert_eq!(sale.lines[0].name_snapshot, "Widget Pro");
        assert_eq!(purchase.lines[0].name_snapshot, "Widget Pro");

        let reopened = harness.open().await;
        let stored = &reopened.documents(DocumentKind::Sale)[0];
        assert_eq!(stored.lines[0].name_snapshot, "Widget Pro");
    }

    #[tokio::test]
    async fn test_customer_rename_reaches_sales_only() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        sell(&mut books, &ali, &widget, 1).await;
        sell(&mut books, &ali, &widget, 1).await;

        let update = books
            .update_party(PartyKind::Customer, &ali.id, party_input("Ali Hassan"))
            .await
            .unwrap();

        assert_eq!(update.renamed_documents, 2);
        assert!(books
            .documents(DocumentKind::Sale)
            .iter()
            .all(|d| d.party_name_snapshot == "Ali Hassan"));
        assert_eq!(
            harness.notifier.last().unwrap().message,
            "Customer Ali Hassan updated, 2 document(s) renamed"
        );
    }

    #[tokio::test]
    async fn test_failed_rename_is_kept_pending_and_retried() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let sale = sell(&mut books, &ali, &widget, 1).await;

        harness.store.fail_writes(true);
        let err = books
            .update_item(&widget.id, widget_input("Gadget"))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::PersistenceFailed { .. }));
        assert_eq!(books.item(&widget.id).unwrap().name, "Widget");
        assert_eq!(
            books.document(DocumentKind::Sale, &sale.id).unwrap().lines[0].name_snapshot,
            "Widget"
        );
        assert_eq!(books.pending_renames().len(), 1);
        assert_eq!(books.pending_renames()[0].new_name, "Gadget");

        // Still failing: the marker survives.
        assert!(books.retry_pending_renames().await.is_err());
        assert_eq!(books.pending_renames().len(), 1);

        harness.store.fail_writes(false);
        assert_eq!(books.retry_pending_renames().await.unwrap(), 1);
        assert!(books.pending_renames().is_empty());
        assert_eq!(books.item(&widget.id).unwrap().name, "Gadget");
        assert_eq!(
            books.document(DocumentKind::Sale, &sale.id).unwrap().lines[0].name_snapshot,
            "Gadget"
        );
        // Cost and price were not part of the retry.
        assert_eq!(books.item(&widget.id).unwrap().price, Money::from_major(50));
    }

    #[tokio::test]
    async fn test_repeated_failed_rename_keeps_one_marker() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;

        harness.store.fail_writes(true);
        let _ = books.update_item(&widget.id, widget_input("Gadget")).await;
        let _ = books.update_item(&widget.id, widget_input("Gizmo")).await;

        assert_eq!(books.pending_renames().len(), 1);
        assert_eq!(books.pending_renames()[0].new_name, "Gizmo");
    }

    #[tokio::test]
    async fn test_pending_rename_survives_reopen() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;

        harness.store.fail_writes(true);
        let _ = books.update_item(&widget.id, widget_input("Gadget")).await;
        harness.store.fail_writes(false);

        // The marker could not be written yet; it goes out with this batch.
        add_party(&mut books, PartyKind::Customer, "Ali").await;

        let mut reopened = harness.open().await;
        assert_eq!(reopened.pending_renames().len(), 1);
        assert_eq!(reopened.pending_renames()[0].record_id, widget.id);
        assert_eq!(reopened.pending_renames()[0].new_name, "Gadget");

        assert_eq!(reopened.retry_pending_renames().await.unwrap(), 1);
        assert_eq!(reopened.item(&widget.id).unwrap().name, "Gadget");

        let again = harness.open().await;
        assert!(again.pending_renames().is_empty());
        assert_eq!(again.item(&widget.id).unwrap().name, "Gadget");
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore_round_trip() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let ali = books
            .add_party(PartyKind::Customer, party_input("Ali"))
            .await
            .unwrap();

        let tombstone = books
            .soft_delete_party(PartyKind::Customer, &ali.id)
            .await
            .unwrap()
            .unwrap();
        assert!(books.party(PartyKind::Customer, &ali.id).is_none());
        assert_eq!(tombstone.record_name, "Ali");

        let reopened = harness.open().await;
        assert_eq!(reopened.trash().len(), 1);

        books.restore(&tombstone.id).await.unwrap();
        assert_eq!(books.party(PartyKind::Customer, &ali.id), Some(&ali));
        assert!(books.trash().is_empty());
    }

    #[tokio::test]
    async fn test_declined_soft_delete_keeps_record() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 3).await;
        harness.confirm.answer(false);

        let outcome = books.soft_delete_item(&widget.id).await.unwrap();

        assert!(outcome.is_none());
        assert!(books.item(&widget.id).is_some());
        assert!(books.trash().is_empty());
    }

    #[tokio::test]
    async fn test_restore_refuses_name_conflict() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 3).await;
        let tombstone = books.soft_delete_item(&widget.id).await.unwrap().unwrap();
        add_item(&mut books, "widget", 1).await;

        let err = books.restore(&tombstone.id).await.unwrap_err();

        assert!(err.is_user_error());
        assert_eq!(books.trash().len(), 1);
        assert!(books.item(&widget.id).is_none());
    }

    #[tokio::test]
    async fn test_failed_soft_delete_rolls_back() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 3).await;

        harness.store.fail_writes(true);
        assert!(books.soft_delete_item(&widget.id).await.is_err());

        assert!(books.item(&widget.id).is_some());
        assert!(books.trash().is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired_uses_retention() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 3).await;
        books.soft_delete_item(&widget.id).await.unwrap();

        assert_eq!(books.purge_expired(Utc::now()).await.unwrap(), 0);

        let later = Utc::now() + chrono::Duration::days(31);
        assert_eq!(books.purge_expired(later).await.unwrap(), 1);
        assert!(books.trash().is_empty());
        assert!(harness.open().await.trash().is_empty());
    }
}
