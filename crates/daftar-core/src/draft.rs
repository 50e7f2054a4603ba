//! # Draft Line Editor
//!
//! Builds the line list of a document before it is committed.
//!
//! ## Draft Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UI Action             Draft call                   Line list change    │
//! │  ─────────             ──────────                   ────────────────    │
//! │                                                                         │
//! │  Pick item + qty ────► add_line(item, qty, amount)                      │
//! │                          ├── item already listed ► quantity += qty      │
//! │                          └── otherwise ──────────► push(snapshot line)  │
//! │                                                                         │
//! │  Click remove ───────► remove_line(index) ───────► lines.remove(i)      │
//! │                                                                         │
//! │  Every change ───────► totals() ─────────────────► (read only)          │
//! │                                                                         │
//! │  A rejected call leaves the draft exactly as it was.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Editing a committed sale
//! A draft opened with [`Draft::from_document`] remembers the quantities the
//! stored sale already took out of stock. Those units come back when the edit
//! is committed (the old delta is reversed first), so the stock ceiling for a
//! line is `item.stock + reserved`.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::repository::ItemRepository;
use crate::totals::Totals;
use crate::types::{Document, DocumentKind, DocumentLine, Item};
use crate::validation::{self, ValidationResult};

/// An in-progress document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    kind: DocumentKind,
    /// Id of the committed document this draft edits.
    editing: Option<String>,
    date: Option<NaiveDate>,
    party_id: Option<String>,
    notes: String,
    tax_applied: bool,
    paid_amount: Money,
    lines: Vec<DocumentLine>,
    /// Per-item quantities the edited sale already holds.
    reserved: HashMap<String, i64>,
}

impl Draft {
    /// Fresh draft for a new document.
    pub fn new(kind: DocumentKind) -> Self {
        Draft {
            kind,
            editing: None,
            date: None,
            party_id: None,
            notes: String::new(),
            tax_applied: false,
            paid_amount: Money::zero(),
            lines: Vec::new(),
            reserved: HashMap::new(),
        }
    }

    /// Draft pre-filled from a committed document, for the edit path.
    pub fn from_document(document: &Document) -> Self {
        let mut reserved = HashMap::new();
        if document.kind == DocumentKind::Sale {
            for line in &document.lines {
                *reserved.entry(line.item_id.clone()).or_insert(0) += line.quantity;
            }
        }

        Draft {
            kind: document.kind,
            editing: Some(document.id.clone()),
            date: Some(document.date),
            party_id: Some(document.party_id.clone()),
            notes: document.notes.clone(),
            tax_applied: document.tax_applied,
            paid_amount: document.paid_amount,
            lines: document.lines.clone(),
            reserved,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn party_id(&self) -> Option<&str> {
        self.party_id.as_deref()
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn tax_applied(&self) -> bool {
        self.tax_applied
    }

    pub fn paid_amount(&self) -> Money {
        self.paid_amount
    }

    pub fn lines(&self) -> &[DocumentLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = Some(date);
    }

    pub fn set_party(&mut self, party_id: impl Into<String>) {
        self.party_id = Some(party_id.into());
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn set_tax_applied(&mut self, tax_applied: bool) -> Totals {
        self.tax_applied = tax_applied;
        self.totals()
    }

    pub fn set_paid_amount(&mut self, paid: Money) -> ValidationResult<Totals> {
        validation::validate_paid_amount(paid)?;
        self.paid_amount = paid;
        Ok(self.totals())
    }

    /// Stock a sale line for `item` may use.
    pub fn available_stock(&self, item: &Item) -> i64 {
        item.stock + self.reserved.get(&item.id).copied().unwrap_or(0)
    }

    /// Adds a line or merges it into the existing line for the same item.
    ///
    /// ## Errors
    /// - non-positive quantity or unit amount
    /// - unknown item id
    /// - sales only: resulting quantity above the item's available stock
    pub fn add_line(
        &mut self,
        items: &ItemRepository,
        item_id: &str,
        quantity: i64,
        unit_amount: Money,
    ) -> CoreResult<Totals> {
        validation::validate_quantity(quantity)?;
        validation::validate_unit_amount(unit_amount)?;

        let item = items
            .get(item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;

        let position = self.lines.iter().position(|l| l.item_id == item_id);
        let already = position.map(|i| self.lines[i].quantity).unwrap_or(0);
        let requested = already.saturating_add(quantity);
        validation::validate_quantity(requested)?;

        if self.kind == DocumentKind::Sale {
            let available = self.available_stock(item);
            if requested > available {
                return Err(CoreError::InsufficientStock {
                    item: item.name.clone(),
                    available,
                    requested,
                });
            }
        }

        match position {
            Some(i) => self.lines[i].merge_quantity(quantity),
            None => self.lines.push(DocumentLine::new(item, quantity, unit_amount)),
        }

        Ok(self.totals())
    }

    /// Removes the line at `index`.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<DocumentLine> {
        if index >= self.lines.len() {
            return Err(CoreError::LineOutOfRange {
                index,
                len: self.lines.len(),
            });
        }
        Ok(self.lines.remove(index))
    }

    pub fn totals(&self) -> Totals {
        Totals::compute(&self.lines, self.tax_applied, self.paid_amount)
    }

    /// Back to a fresh draft of the same kind.
    pub fn clear(&mut self) {
        *self = Draft::new(self.kind);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::types::EntityType;
    use chrono::Utc;

    fn items() -> ItemRepository {
        let widget = Item {
            id: "1".to_string(),
            code: "IT001".to_string(),
            name: "Widget".to_string(),
            cost: Money::from_major(30),
            price: Money::from_major(50),
            stock: 6,
        };
        let gadget = Item {
            id: "2".to_string(),
            code: "IT002".to_string(),
            name: "Gadget".to_string(),
            cost: Money::from_major(5),
            price: Money::from_major(9),
            stock: 0,
        };
        ItemRepository::from_records(EntityType::Item, vec![widget, gadget]).unwrap()
    }

    #[test]
    fn test_oversized_quantity_is_rejected_not_overflowed() {
        let mut draft = Draft::new(DocumentKind::Purchase);

        let err = draft
            .add_line(&items(), "1", i64::MAX / 2, Money::from_major(1))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::TooLarge { .. })
        ));

        draft
            .add_line(&items(), "1", validation::MAX_QUANTITY, Money::from_major(1))
            .unwrap();
        assert!(draft
            .add_line(&items(), "1", 1, Money::from_major(1))
            .is_err());
        assert_eq!(draft.lines()[0].quantity, validation::MAX_QUANTITY);
    }

    #[test]
    fn test_add_line_snapshots_name_and_recomputes_totals() {
        let mut draft = Draft::new(DocumentKind::Sale);
        let totals = draft.add_line(&items(), "1", 4, Money::from_major(50)).unwrap();

        assert_eq!(draft.lines().len(), 1);
        assert_eq!(draft.lines()[0].name_snapshot, "Widget");
        assert_eq!(totals.subtotal, Money::from_major(200));
    }

    #[test]
    fn test_same_item_merges_quantity() {
        let mut draft = Draft::new(DocumentKind::Sale);
        let items = items();
        draft.add_line(&items, "1", 2, Money::from_major(50)).unwrap();
        draft.add_line(&items, "1", 3, Money::from_major(50)).unwrap();

        assert_eq!(draft.lines().len(), 1);
        assert_eq!(draft.lines()[0].quantity, 5);
        assert_eq!(draft.lines()[0].line_total, Money::from_major(250));
    }

    #[test]
    fn test_sale_over_stock_rejected_and_draft_unchanged() {
        let mut draft = Draft::new(DocumentKind::Sale);
        let items = items();
        draft.add_line(&items, "1", 2, Money::from_major(50)).unwrap();
        let before = draft.clone();

        let err = draft.add_line(&items, "1", 12, Money::from_major(50)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 6, requested: 14, .. }
        ));
        assert_eq!(draft, before);

        // merged quantity counts toward the ceiling
        assert!(draft.add_line(&items, "1", 5, Money::from_major(50)).is_err());
        assert!(draft.add_line(&items, "1", 4, Money::from_major(50)).is_ok());
    }

    #[test]
    fn test_purchase_has_no_stock_ceiling() {
        let mut draft = Draft::new(DocumentKind::Purchase);
        draft.add_line(&items(), "2", 100, Money::from_major(5)).unwrap();
        assert_eq!(draft.lines()[0].quantity, 100);
    }

    #[test]
    fn test_invalid_input_rejected() {
        let mut draft = Draft::new(DocumentKind::Purchase);
        let items = items();

        let err = draft.add_line(&items, "1", 0, Money::from_major(5)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));
        assert!(draft.add_line(&items, "1", 1, Money::zero()).is_err());
        assert!(matches!(
            draft.add_line(&items, "nope", 1, Money::from_major(5)),
            Err(CoreError::ItemNotFound(_))
        ));
        assert!(draft.is_empty());
    }

    #[test]
    fn test_remove_line() {
        let mut draft = Draft::new(DocumentKind::Purchase);
        let items = items();
        draft.add_line(&items, "1", 1, Money::from_major(5)).unwrap();
        draft.add_line(&items, "2", 1, Money::from_major(5)).unwrap();

        let removed = draft.remove_line(0).unwrap();
        assert_eq!(removed.item_id, "1");
        assert_eq!(draft.lines()[0].item_id, "2");

        assert!(matches!(
            draft.remove_line(5),
            Err(CoreError::LineOutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn test_tax_and_payment_feed_totals() {
        let mut draft = Draft::new(DocumentKind::Sale);
        draft.add_line(&items(), "1", 4, Money::from_major(50)).unwrap();
        draft.set_tax_applied(true);
        let totals = draft.set_paid_amount(Money::from_major(100)).unwrap();

        assert_eq!(totals.total, Money::from_major(230));
        assert_eq!(totals.remaining, Money::from_major(130));
        assert!(draft.set_paid_amount(Money::from_minor(-1)).is_err());
        assert_eq!(draft.paid_amount(), Money::from_major(100));
    }

    #[test]
    fn test_edit_draft_credits_reserved_quantities() {
        let items = items();
        let mut sale_draft = Draft::new(DocumentKind::Sale);
        sale_draft.set_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        sale_draft.set_party("c-1");
        sale_draft.add_line(&items, "1", 4, Money::from_major(50)).unwrap();

        let now = Utc::now();
        let committed = Document {
            id: "doc-1".to_string(),
            kind: DocumentKind::Sale,
            sequence_number: 1,
            date: sale_draft.date().unwrap(),
            party_id: "c-1".to_string(),
            party_name_snapshot: "Customer".to_string(),
            notes: String::new(),
            lines: sale_draft.lines().to_vec(),
            subtotal: Money::from_major(200),
            tax_applied: false,
            tax: Money::zero(),
            total: Money::from_major(200),
            paid_amount: Money::zero(),
            remaining_amount: Money::from_major(200),
            created_at: now,
            updated_at: now,
        };

        // stock after the sale was committed: 6 - 4 = 2
        let mut after_sale = items.clone();
        after_sale.get_mut("1").unwrap().stock = 2;

        let mut edit = Draft::from_document(&committed);
        assert_eq!(edit.editing_id(), Some("doc-1"));
        assert_eq!(edit.available_stock(after_sale.get("1").unwrap()), 6);

        // 4 on the sale + 2 more fits in 2 + 4 reserved
        edit.add_line(&after_sale, "1", 2, Money::from_major(50)).unwrap();
        assert_eq!(edit.lines()[0].quantity, 6);
        assert!(edit.add_line(&after_sale, "1", 1, Money::from_major(50)).is_err());
    }

    #[test]
    fn test_clear_keeps_kind() {
        let mut draft = Draft::new(DocumentKind::Purchase);
        draft.set_notes("x");
        draft.add_line(&items(), "1", 1, Money::from_major(5)).unwrap();
        draft.clear();
        assert_eq!(draft, Draft::new(DocumentKind::Purchase));
    }
}
