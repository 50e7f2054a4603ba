//! # Document Commit Protocol
//!
//! Turns a [`Draft`] into a committed sale or purchase and keeps stock in
//! step with every create, edit and delete.
//!
//! ## Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CREATE  draft (no editing id)                                          │
//! │    validate → totals → stock covers? → next sequence number             │
//! │    → apply delta → save [documents, items, sequences]                   │
//! │                                                                         │
//! │  EDIT    draft opened from document D                                   │
//! │    validate → totals → REVERSE stored D → stock covers new? →           │
//! │    APPLY new → stock ≥ 0? → replace D content (id, number kept)         │
//! │    → save [documents, items]                                            │
//! │                                                                         │
//! │  DELETE  confirm → reverse D → stock ≥ 0? → remove D                    │
//! │    → save [documents, items]                                            │
//! │                                                                         │
//! │  Any failure after the snapshot puts the snapshot back.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reversal always runs before the new delta is applied, so an edit from
//! `[A:2]` to `[A:5]` on a sale moves stock by exactly −3.

use std::collections::HashSet;

use chrono::Utc;
use daftar_core::stock::{ensure_stock_covers, find_negative_stock};
use daftar_core::{
    apply_stock_delta, reverse_stock_delta, validation, CoreError, Document, DocumentKind, Draft,
    Money, StockDirection, StockReport, Totals, ValidationError,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::books::Books;
use crate::error::{EngineError, EngineResult};
use crate::ports::ConfirmRequest;
use crate::state::{Collection, LedgerState};

impl Books {
    // =========================================================================
    // Drafts
    // =========================================================================

    /// An empty draft for a new document.
    pub fn new_draft(&self, kind: DocumentKind) -> Draft {
        Draft::new(kind)
    }

    /// A draft holding the content of a committed document, for editing.
    pub fn edit_draft(&self, kind: DocumentKind, id: &str) -> EngineResult<Draft> {
        let document = self.state.book(kind).require(id)?;
        Ok(Draft::from_document(document))
    }

    /// Adds a line to `draft` (or merges it into the line for the same item)
    /// and returns the recomputed totals. A rejected line leaves the draft
    /// unchanged.
    pub fn add_line(
        &self,
        draft: &mut Draft,
        item_id: &str,
        quantity: i64,
        unit_amount: Money,
    ) -> EngineResult<Totals> {
        let result = draft
            .add_line(&self.state.items, item_id, quantity, unit_amount)
            .map_err(EngineError::from);
        self.finish(result, |_| None)
    }

    /// Removes the line at `index` and returns the recomputed totals.
    pub fn remove_line(&self, draft: &mut Draft, index: usize) -> EngineResult<Totals> {
        let result = draft
            .remove_line(index)
            .map(|_| draft.totals())
            .map_err(EngineError::from);
        self.finish(result, |_| None)
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Creates a document from a fresh draft, or replaces the content of the
    /// document the draft was opened from.
    pub async fn commit_draft(&mut self, draft: &Draft) -> EngineResult<Document> {
        let result = match draft.editing_id() {
            None => self.create_document(draft).await,
            Some(id) => self.edit_document(draft, id).await,
        };
        let verb = if draft.editing_id().is_some() {
            "updated"
        } else {
            "saved"
        };
        self.finish(result, |document| {
            Some(format!(
                "{} {} {} (total {})",
                document.kind,
                document.code(),
                verb,
                self.config.format_amount(document.total)
            ))
        })
    }

    async fn create_document(&mut self, draft: &Draft) -> EngineResult<Document> {
        let kind = draft.kind();
        let direction = kind.stock_direction();
        let document = self.build_document(draft, None)?;
        ensure_stock_covers(&self.state.items, &document, direction)?;

        let snapshot = self.state.clone();
        let report = apply_stock_delta(&mut self.state.items, &document, direction);
        log_stock_report(&document, &report);
        let created = self.state.book_mut(kind).push_new(document).clone();

        self.persist(
            snapshot,
            &[
                Collection::documents(kind),
                Collection::Items,
                Collection::Sequences,
            ],
        )
        .await?;

        info!(
            kind = %kind,
            code = %created.code(),
            lines = created.lines.len(),
            total = %created.total,
            "Document created"
        );
        Ok(created)
    }

    async fn edit_document(&mut self, draft: &Draft, id: &str) -> EngineResult<Document> {
        let kind = draft.kind();
        let direction = kind.stock_direction();
        let stored = self.state.book(kind).require(id)?.clone();
        let document = self.build_document(draft, Some(&stored))?;

        let snapshot = self.state.clone();
        if let Err(err) = self.swap_stock(&snapshot, &stored, &document, direction) {
            self.state = snapshot;
            return Err(err);
        }

        let updated = match self.state.book_mut(kind).replace(document) {
            Ok(updated) => updated.clone(),
            Err(err) => {
                self.state = snapshot;
                return Err(err.into());
            }
        };

        self.persist(snapshot, &[Collection::documents(kind), Collection::Items])
            .await?;

        info!(
            kind = %kind,
            code = %updated.code(),
            total = %updated.total,
            "Document updated"
        );
        Ok(updated)
    }

    /// Reverses `stored` then applies `document`. Errors leave the items
    /// half-moved; the caller restores the snapshot.
    fn swap_stock(
        &mut self,
        snapshot: &LedgerState,
        stored: &Document,
        document: &Document,
        direction: StockDirection,
    ) -> EngineResult<()> {
        let reversed = reverse_stock_delta(&mut self.state.items, stored, direction);
        log_stock_report(stored, &reversed);

        ensure_stock_covers(&self.state.items, document, direction)?;

        let applied = apply_stock_delta(&mut self.state.items, document, direction);
        log_stock_report(document, &applied);

        // A purchase edited down below what has since been sold.
        let ids = stored.lines.iter().map(|line| line.item_id.as_str());
        if let Some(item) = find_negative_stock(&self.state.items, ids) {
            return Err(CoreError::InsufficientStock {
                item: item.name.clone(),
                available: snapshot.items.stock_of(&item.id).unwrap_or(0),
                requested: stored.quantity_of(&item.id) - document.quantity_of(&item.id),
            }
            .into());
        }

        Ok(())
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Permanently deletes a document after confirmation, giving its stock
    /// effect back. `Ok(None)` when the user declines.
    pub async fn delete_document(
        &mut self,
        kind: DocumentKind,
        id: &str,
    ) -> EngineResult<Option<Document>> {
        let result = self.delete_document_inner(kind, id).await;
        self.finish(result, |deleted| {
            deleted
                .as_ref()
                .map(|document| format!("{} {} deleted", document.kind, document.code()))
        })
    }

    async fn delete_document_inner(
        &mut self,
        kind: DocumentKind,
        id: &str,
    ) -> EngineResult<Option<Document>> {
        let document = self.state.book(kind).require(id)?.clone();

        if !self
            .confirm(ConfirmRequest::delete(kind, document.code()))
            .await
        {
            return Ok(None);
        }

        let direction = kind.stock_direction();
        let snapshot = self.state.clone();
        let report = reverse_stock_delta(&mut self.state.items, &document, direction);
        log_stock_report(&document, &report);

        let ids = document.lines.iter().map(|line| line.item_id.as_str());
        if let Some(item) = find_negative_stock(&self.state.items, ids) {
            let err = CoreError::InsufficientStock {
                item: item.name.clone(),
                available: snapshot.items.stock_of(&item.id).unwrap_or(0),
                requested: document.quantity_of(&item.id),
            };
            self.state = snapshot;
            return Err(err.into());
        }

        let removed = match self.state.book_mut(kind).remove(id) {
            Ok(removed) => removed,
            Err(err) => {
                self.state = snapshot;
                return Err(err.into());
            }
        };

        self.persist(snapshot, &[Collection::documents(kind), Collection::Items])
            .await?;

        info!(kind = %kind, code = %removed.code(), "Document deleted");
        Ok(Some(removed))
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validates a draft into a document with fresh totals. Nothing is
    /// mutated.
    ///
    /// An edited document may keep referencing an item or party that has
    /// since been soft-deleted; anything new must be active.
    fn build_document(&self, draft: &Draft, stored: Option<&Document>) -> EngineResult<Document> {
        let kind = draft.kind();
        let party_kind = kind.party_kind();

        let date = draft.date().ok_or_else(|| ValidationError::required("date"))?;
        let party_id = draft
            .party_id()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ValidationError::required(party_kind.to_string().to_lowercase()))?;
        // An edit may keep a party that has since been soft-deleted; its
        // snapshot name stays as stored.
        let party_name_snapshot = match self.state.parties(party_kind).get(party_id) {
            Some(party) => party.name.clone(),
            None => stored
                .filter(|d| d.party_id == party_id)
                .map(|d| d.party_name_snapshot.clone())
                .ok_or_else(|| CoreError::PartyNotFound {
                    kind: party_kind,
                    id: party_id.to_string(),
                })?,
        };

        if draft.lines().is_empty() {
            return Err(ValidationError::Empty {
                field: "lines".to_string(),
            }
            .into());
        }

        let grandfathered: HashSet<&str> = stored
            .map(|d| d.lines.iter().map(|l| l.item_id.as_str()).collect())
            .unwrap_or_default();

        for line in draft.lines() {
            validation::validate_quantity(line.quantity)?;
            validation::validate_unit_amount(line.unit_amount)?;
            if !self.state.items.contains(&line.item_id)
                && !grandfathered.contains(line.item_id.as_str())
            {
                return Err(CoreError::ItemNotFound(line.item_id.clone()).into());
            }
        }
        validation::validate_paid_amount(draft.paid_amount())?;

        let now = Utc::now();
        let lines = draft.lines().to_vec();
        let totals = Totals::compute(&lines, draft.tax_applied(), draft.paid_amount());

        let mut document = Document {
            id: stored
                .map(|d| d.id.clone())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            kind,
            sequence_number: stored.map(|d| d.sequence_number).unwrap_or(0),
            date,
            party_id: party_id.to_string(),
            party_name_snapshot,
            notes: draft.notes().trim().to_string(),
            lines,
            subtotal: Money::zero(),
            tax_applied: draft.tax_applied(),
            tax: Money::zero(),
            total: Money::zero(),
            paid_amount: draft.paid_amount(),
            remaining_amount: Money::zero(),
            created_at: stored.map(|d| d.created_at).unwrap_or(now),
            updated_at: now,
        };
        document.set_totals(totals);

        debug!(kind = %kind, lines = document.lines.len(), total = %document.total, "Draft validated");
        Ok(document)
    }
}

fn log_stock_report(document: &Document, report: &StockReport) {
    if !report.missing_items.is_empty() {
        warn!(
            document = %document.id,
            items = ?report.missing_items,
            "Lines reference items no longer in the repository; stock not moved"
        );
    }
    if !report.clamped_items.is_empty() {
        warn!(
            document = %document.id,
            items = ?report.clamped_items,
            "Stock clamped at zero"
        );
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::NotifyLevel;
    use crate::testing::*;
    use daftar_core::PartyKind;

    #[tokio::test]
    async fn test_create_sale_moves_stock_and_computes_totals() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;

        let sale = sell(&mut books, &ali, &widget, 4).await;

        assert_eq!(sale.subtotal, Money::from_major(200));
        assert_eq!(sale.tax, Money::zero());
        assert_eq!(sale.total, Money::from_major(200));
        assert_eq!(sale.sequence_number, 1);
        assert_eq!(sale.code(), "SAL001");
        assert_eq!(sale.party_name_snapshot, "Ali");
        assert!(sale.totals_consistent());
        assert_eq!(books.stock_of(&widget.id), Some(6));
        assert_eq!(
            harness.notifier.last().unwrap().message,
            "Sale SAL001 saved (total 200.00 SAR)"
        );
    }

    #[tokio::test]
    async fn test_tax_and_remaining_amount() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;

        let mut draft = draft(&books, DocumentKind::Sale, &ali, &[(widget.id.as_str(), 4, 50)]);
        draft.set_tax_applied(true);
        draft.set_paid_amount(Money::from_major(100)).unwrap();
        let sale = books.commit_draft(&draft).await.unwrap();

        assert_eq!(sale.tax, Money::from_major(30));
        assert_eq!(sale.total, Money::from_major(230));
        assert_eq!(sale.remaining_amount, Money::from_major(130));
    }

    #[tokio::test]
    async fn test_purchase_adds_stock() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 0).await;
        let acme = add_party(&mut books, PartyKind::Supplier, "Acme").await;

        let purchase = buy(&mut books, &acme, &widget, 12).await;

        assert_eq!(purchase.code(), "PUR001");
        assert_eq!(books.stock_of(&widget.id), Some(12));
    }

    #[tokio::test]
    async fn test_edit_moves_only_the_difference() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let sale = sell(&mut books, &ali, &widget, 4).await;

        let mut draft = books.edit_draft(DocumentKind::Sale, &sale.id).unwrap();
        books
            .add_line(&mut draft, &widget.id, 2, Money::from_major(50))
            .unwrap();
        let edited = books.commit_draft(&draft).await.unwrap();

        assert_eq!(books.stock_of(&widget.id), Some(4));
        assert_eq!(edited.id, sale.id);
        assert_eq!(edited.sequence_number, sale.sequence_number);
        assert_eq!(edited.created_at, sale.created_at);
        assert_eq!(edited.subtotal, Money::from_major(300));
        assert_eq!(books.documents(DocumentKind::Sale).len(), 1);
    }

    #[tokio::test]
    async fn test_edit_from_two_to_five_takes_three() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let sale = sell(&mut books, &ali, &widget, 2).await;
        assert_eq!(books.stock_of(&widget.id), Some(8));

        let mut draft = books.edit_draft(DocumentKind::Sale, &sale.id).unwrap();
        draft.remove_line(0).unwrap();
        books
            .add_line(&mut draft, &widget.id, 5, Money::from_major(50))
            .unwrap();
        books.commit_draft(&draft).await.unwrap();

        assert_eq!(books.stock_of(&widget.id), Some(5));
    }

    #[tokio::test]
    async fn test_sale_line_above_stock_is_rejected() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        sell(&mut books, &ali, &widget, 4).await;

        let mut draft = books.new_draft(DocumentKind::Sale);
        let err = books
            .add_line(&mut draft, &widget.id, 12, Money::from_major(50))
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientStock {
                available: 6,
                requested: 12,
                ..
            })
        ));
        assert!(draft.is_empty());
        assert_eq!(books.stock_of(&widget.id), Some(6));
        assert_eq!(harness.notifier.last().unwrap().level, NotifyLevel::Warning);
    }

    #[tokio::test]
    async fn test_huge_purchase_quantity_is_rejected() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 0).await;

        let mut draft = books.new_draft(DocumentKind::Purchase);
        let err = books
            .add_line(&mut draft, &widget.id, i64::MAX / 2, Money::from_major(1))
            .unwrap_err();

        assert!(err.is_user_error());
        assert!(draft.is_empty());
        assert_eq!(books.stock_of(&widget.id), Some(0));
    }

    #[tokio::test]
    async fn test_commit_rejects_stale_draft_above_stock() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 5).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;

        let first = draft(&books, DocumentKind::Sale, &ali, &[(widget.id.as_str(), 4, 50)]);
        let second = draft(&books, DocumentKind::Sale, &ali, &[(widget.id.as_str(), 4, 50)]);
        books.commit_draft(&first).await.unwrap();

        let err = books.commit_draft(&second).await.unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(books.stock_of(&widget.id), Some(1));
        assert_eq!(books.documents(DocumentKind::Sale).len(), 1);
    }

    #[tokio::test]
    async fn test_validation_failures_touch_nothing() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let batches = harness.store.batches();

        let mut no_date = books.new_draft(DocumentKind::Sale);
        no_date.set_party(ali.id.clone());
        books
            .add_line(&mut no_date, &widget.id, 1, Money::from_major(50))
            .unwrap();
        assert!(books.commit_draft(&no_date).await.is_err());

        let mut no_party = books.new_draft(DocumentKind::Sale);
        no_party.set_date(day(2));
        books
            .add_line(&mut no_party, &widget.id, 1, Money::from_major(50))
            .unwrap();
        assert!(books.commit_draft(&no_party).await.is_err());

        let mut empty = books.new_draft(DocumentKind::Sale);
        empty.set_date(day(2));
        empty.set_party(ali.id.clone());
        assert!(books.commit_draft(&empty).await.is_err());

        // A customer is not a supplier.
        let mut wrong_party = books.new_draft(DocumentKind::Purchase);
        wrong_party.set_date(day(2));
        wrong_party.set_party(ali.id.clone());
        books
            .add_line(&mut wrong_party, &widget.id, 1, Money::from_major(30))
            .unwrap();
        assert!(matches!(
            books.commit_draft(&wrong_party).await,
            Err(EngineError::Core(CoreError::PartyNotFound { .. }))
        ));

        assert_eq!(harness.store.batches(), batches);
        assert_eq!(books.stock_of(&widget.id), Some(10));
        assert!(books.documents(DocumentKind::Sale).is_empty());
        assert_eq!(harness.notifier.warnings(), 4);
    }

    #[tokio::test]
    async fn test_sequence_numbers_never_reused() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;

        sell(&mut books, &ali, &widget, 1).await;
        let second = sell(&mut books, &ali, &widget, 1).await;
        books
            .delete_document(DocumentKind::Sale, &second.id)
            .await
            .unwrap();

        let third = sell(&mut books, &ali, &widget, 1).await;
        assert_eq!(third.sequence_number, 3);

        books
            .delete_document(DocumentKind::Sale, &third.id)
            .await
            .unwrap();
        let mut reopened = harness.open().await;
        let fourth = sell(&mut reopened, &ali, &widget, 1).await;
        assert_eq!(fourth.sequence_number, 4);
    }

    #[tokio::test]
    async fn test_delete_sale_restores_stock() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let sale = sell(&mut books, &ali, &widget, 4).await;

        let deleted = books
            .delete_document(DocumentKind::Sale, &sale.id)
            .await
            .unwrap();

        assert_eq!(deleted.map(|d| d.id), Some(sale.id));
        assert_eq!(books.stock_of(&widget.id), Some(10));
        assert!(books.documents(DocumentKind::Sale).is_empty());
        assert_eq!(harness.confirm.asked(), 1);
    }

    #[tokio::test]
    async fn test_declined_delete_changes_nothing() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let sale = sell(&mut books, &ali, &widget, 4).await;
        harness.confirm.answer(false);

        let deleted = books
            .delete_document(DocumentKind::Sale, &sale.id)
            .await
            .unwrap();

        assert!(deleted.is_none());
        assert_eq!(books.stock_of(&widget.id), Some(6));
        assert_eq!(books.documents(DocumentKind::Sale).len(), 1);
    }

    #[tokio::test]
    async fn test_delete_purchase_already_sold_is_rejected() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 0).await;
        let acme = add_party(&mut books, PartyKind::Supplier, "Acme").await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let purchase = buy(&mut books, &acme, &widget, 5).await;
        sell(&mut books, &ali, &widget, 3).await;

        let err = books
            .delete_document(DocumentKind::Purchase, &purchase.id)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientStock {
                available: 2,
                requested: 5,
                ..
            })
        ));
        assert_eq!(books.stock_of(&widget.id), Some(2));
        assert_eq!(books.documents(DocumentKind::Purchase).len(), 1);
    }

    #[tokio::test]
    async fn test_edit_purchase_below_sold_is_rejected() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 0).await;
        let acme = add_party(&mut books, PartyKind::Supplier, "Acme").await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let purchase = buy(&mut books, &acme, &widget, 5).await;
        sell(&mut books, &ali, &widget, 3).await;

        let mut draft = books.edit_draft(DocumentKind::Purchase, &purchase.id).unwrap();
        draft.remove_line(0).unwrap();
        books
            .add_line(&mut draft, &widget.id, 1, Money::from_major(30))
            .unwrap();
        let err = books.commit_draft(&draft).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientStock {
                available: 2,
                requested: 4,
                ..
            })
        ));
        assert_eq!(books.stock_of(&widget.id), Some(2));
        assert_eq!(
            books.document(DocumentKind::Purchase, &purchase.id).unwrap().lines[0].quantity,
            5
        );
    }

    #[tokio::test]
    async fn test_failed_create_rolls_back() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let draft = draft(&books, DocumentKind::Sale, &ali, &[(widget.id.as_str(), 4, 50)]);

        harness.store.fail_writes(true);
        let err = books.commit_draft(&draft).await.unwrap_err();

        assert!(matches!(err, EngineError::PersistenceFailed { .. }));
        assert_eq!(books.stock_of(&widget.id), Some(10));
        assert!(books.documents(DocumentKind::Sale).is_empty());
        assert_eq!(books.next_sequence(DocumentKind::Sale), 1);
        assert_eq!(harness.notifier.last().unwrap().level, NotifyLevel::Error);

        harness.store.fail_writes(false);
        let sale = books.commit_draft(&draft).await.unwrap();
        assert_eq!(sale.sequence_number, 1);
        assert_eq!(books.stock_of(&widget.id), Some(6));
    }

    #[tokio::test]
    async fn test_failed_edit_rolls_back() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let sale = sell(&mut books, &ali, &widget, 4).await;

        let mut draft = books.edit_draft(DocumentKind::Sale, &sale.id).unwrap();
        books
            .add_line(&mut draft, &widget.id, 2, Money::from_major(50))
            .unwrap();
        harness.store.fail_writes(true);
        assert!(books.commit_draft(&draft).await.is_err());

        assert_eq!(books.stock_of(&widget.id), Some(6));
        assert_eq!(books.document(DocumentKind::Sale, &sale.id), Some(&sale));
    }

    #[tokio::test]
    async fn test_failed_delete_rolls_back() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let sale = sell(&mut books, &ali, &widget, 4).await;

        harness.store.fail_writes(true);
        let err = books
            .delete_document(DocumentKind::Sale, &sale.id)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::PersistenceFailed { .. }));
        assert_eq!(books.stock_of(&widget.id), Some(6));
        assert_eq!(books.documents(DocumentKind::Sale).len(), 1);

        let reopened = harness.open().await;
        assert_eq!(reopened.stock_of(&widget.id), Some(6));
    }

    #[tokio::test]
    async fn test_edit_keeps_lines_of_soft_deleted_item() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let bolt = add_item(&mut books, "Bolt", 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let draft = draft(
            &books,
            DocumentKind::Sale,
            &ali,
            &[(widget.id.as_str(), 2, 50), (bolt.id.as_str(), 1, 5)],
        );
        let sale = books.commit_draft(&draft).await.unwrap();
        books.soft_delete_item(&widget.id).await.unwrap();

        let mut draft = books.edit_draft(DocumentKind::Sale, &sale.id).unwrap();
        books
            .add_line(&mut draft, &bolt.id, 1, Money::from_major(5))
            .unwrap();
        let edited = books.commit_draft(&draft).await.unwrap();

        assert_eq!(edited.quantity_of(&widget.id), 2);
        assert_eq!(books.stock_of(&bolt.id), Some(8));
    }

    #[tokio::test]
    async fn test_edit_keeps_soft_deleted_party() {
        let harness = Harness::new().await;
        let mut books = harness.open().await;
        let widget = add_widget(&mut books, 10).await;
        let ali = add_party(&mut books, PartyKind::Customer, "Ali").await;
        let sara = add_party(&mut books, PartyKind::Customer, "Sara").await;
        let sale = sell(&mut books, &ali, &widget, 2).await;
        books
            .soft_delete_party(PartyKind::Customer, &ali.id)
            .await
            .unwrap();

        let mut draft = books.edit_draft(DocumentKind::Sale, &sale.id).unwrap();
        draft.set_notes("second visit");
        let edited = books.commit_draft(&draft).await.unwrap();
        assert_eq!(edited.party_id, ali.id);
        assert_eq!(edited.party_name_snapshot, "Ali");
        assert_eq!(edited.notes, "second visit");

        // A new sale cannot pick the deleted customer.
        let mut fresh = crate::testing::draft(
            &books,
            DocumentKind::Sale,
            &sara,
            &[(widget.id.as_str(), 1, 50)],
        );
        fresh.set_party(&ali.id);
        let err = books.commit_draft(&fresh).await.unwrap_err();
        assert!(err.is_user_error());

        // Nor can an edit move the sale onto another missing party.
        let sara_sale = sell(&mut books, &sara, &widget, 1).await;
        let mut moved = books.edit_draft(DocumentKind::Sale, &sara_sale.id).unwrap();
        moved.set_party(&ali.id);
        assert!(books.commit_draft(&moved).await.is_err());
        assert_eq!(books.stock_of(&widget.id), Some(7));
    }
}
