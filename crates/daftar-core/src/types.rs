//! # Domain Types
//!
//! Records kept in the books.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │     Party       │   │   CashEntry     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code  IT001    │   │  code CU/SU001  │   │  date, amount   │       │
//! │  │  name, stock    │   │  name, phone    │   │  category       │       │
//! │  └────────▲────────┘   └────────▲────────┘   └─────────────────┘       │
//! │           │ item_id             │ party_id                              │
//! │  ┌────────┴────────┐   ┌────────┴────────┐                              │
//! │  │  DocumentLine   │◄──│    Document     │  Sale | Purchase             │
//! │  │  name_snapshot  │   │  sequence no.   │  SAL001 / PUR001             │
//! │  │  qty × amount   │   │  totals         │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every record has:
//! - `id`: UUID v4, immutable, used for references between records
//! - Business code (`IT001`, `CU001`, `SAL001`): human-readable
//!
//! Documents copy the item and party names they reference (`name_snapshot`,
//! `party_name_snapshot`). The copies are refreshed by the rename cascade.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::stock::StockDirection;
use crate::totals::Totals;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points. 1500 bps = 15%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// For display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Entity kinds
// =============================================================================

/// Which party repository a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PartyKind {
    Customer,
    Supplier,
}

impl PartyKind {
    /// Prefix of the business code, `CU001` / `SU001`.
    pub const fn code_prefix(self) -> &'static str {
        match self {
            PartyKind::Customer => "CU",
            PartyKind::Supplier => "SU",
        }
    }

    pub const fn entity_type(self) -> EntityType {
        match self {
            PartyKind::Customer => EntityType::Customer,
            PartyKind::Supplier => EntityType::Supplier,
        }
    }

    /// The document variant whose counterparty is this kind of party.
    pub const fn document_kind(self) -> DocumentKind {
        match self {
            PartyKind::Customer => DocumentKind::Sale,
            PartyKind::Supplier => DocumentKind::Purchase,
        }
    }
}

impl fmt::Display for PartyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartyKind::Customer => f.write_str("Customer"),
            PartyKind::Supplier => f.write_str("Supplier"),
        }
    }
}

/// Kinds of records that can be soft-deleted and renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Item,
    Customer,
    Supplier,
}

impl EntityType {
    pub const fn party_kind(self) -> Option<PartyKind> {
        match self {
            EntityType::Item => None,
            EntityType::Customer => Some(PartyKind::Customer),
            EntityType::Supplier => Some(PartyKind::Supplier),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Item => f.write_str("Item"),
            EntityType::Customer => f.write_str("Customer"),
            EntityType::Supplier => f.write_str("Supplier"),
        }
    }
}

/// Document variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Sale,
    Purchase,
}

impl DocumentKind {
    pub const fn code_prefix(self) -> &'static str {
        match self {
            DocumentKind::Sale => "SAL",
            DocumentKind::Purchase => "PUR",
        }
    }

    /// Sales take stock out, purchases bring it in.
    pub const fn stock_direction(self) -> StockDirection {
        match self {
            DocumentKind::Sale => StockDirection::Outbound,
            DocumentKind::Purchase => StockDirection::Inbound,
        }
    }

    pub const fn party_kind(self) -> PartyKind {
        match self {
            DocumentKind::Sale => PartyKind::Customer,
            DocumentKind::Purchase => PartyKind::Supplier,
        }
    }

    /// Renders a sequence number as a business code, `SAL001`.
    pub fn format_code(self, sequence_number: u64) -> String {
        format!("{}{:03}", self.code_prefix(), sequence_number)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Sale => f.write_str("Sale"),
            DocumentKind::Purchase => f.write_str("Purchase"),
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// A catalog item with stock on hand.
///
/// `stock` changes only through the stock ledger; other fields through edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub code: String,
    pub name: String,
    /// Purchase cost per unit.
    pub cost: Money,
    /// Selling price per unit.
    pub price: Money,
    pub stock: i64,
}

impl Item {
    /// Value of the stock on hand at cost.
    pub fn stock_value(&self) -> Money {
        self.cost.multiply_quantity(self.stock)
    }
}

// =============================================================================
// Party
// =============================================================================

/// A customer or supplier. Both kinds share this shape; the repository they
/// live in decides which one they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id: String,
    pub code: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Document Line
// =============================================================================

/// One item-quantity-amount entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLine {
    pub item_id: String,
    /// Item name when the line was added (frozen until a rename cascade).
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_amount: Money,
    pub line_total: Money,
}

impl DocumentLine {
    pub fn new(item: &Item, quantity: i64, unit_amount: Money) -> Self {
        DocumentLine {
            item_id: item.id.clone(),
            name_snapshot: item.name.clone(),
            quantity,
            unit_amount,
            line_total: unit_amount.multiply_quantity(quantity),
        }
    }

    /// Adds `quantity` to this line and recomputes its total.
    ///
    /// The unit amount of the existing line is kept.
    pub fn merge_quantity(&mut self, quantity: i64) {
        self.quantity += quantity;
        self.line_total = self.unit_amount.multiply_quantity(self.quantity);
    }
}

// =============================================================================
// Document
// =============================================================================

/// A committed sales or purchase invoice.
///
/// ## Invariants
/// - `subtotal == Σ lines.line_total`
/// - `tax == subtotal × 15%` when `tax_applied`, else zero
/// - `total == subtotal + tax`
/// - `remaining_amount == total − paid_amount` (negative on overpayment)
/// - `sequence_number` never changes after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub kind: DocumentKind,
    pub sequence_number: u64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub party_id: String,
    pub party_name_snapshot: String,
    pub notes: String,
    pub lines: Vec<DocumentLine>,
    pub subtotal: Money,
    pub tax_applied: bool,
    pub tax: Money,
    pub total: Money,
    pub paid_amount: Money,
    pub remaining_amount: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Business code, `SAL001` / `PUR001`.
    pub fn code(&self) -> String {
        self.kind.format_code(self.sequence_number)
    }

    pub fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
            remaining: self.remaining_amount,
        }
    }

    pub fn set_totals(&mut self, totals: Totals) {
        self.subtotal = totals.subtotal;
        self.tax = totals.tax;
        self.total = totals.total;
        self.remaining_amount = totals.remaining;
    }

    /// Checks the stored totals against the lines.
    pub fn totals_consistent(&self) -> bool {
        let expected = Totals::compute(&self.lines, self.tax_applied, self.paid_amount);
        expected == self.totals()
    }

    /// Total quantity of `item_id` across the lines.
    pub fn quantity_of(&self, item_id: &str) -> i64 {
        self.lines
            .iter()
            .filter(|line| line.item_id == item_id)
            .map(|line| line.quantity)
            .sum()
    }
}

// =============================================================================
// Cash entries
// =============================================================================

/// Expense or revenue book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CashKind {
    Expense,
    Revenue,
}

impl fmt::Display for CashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CashKind::Expense => f.write_str("Expense"),
            CashKind::Revenue => f.write_str("Revenue"),
        }
    }
}

/// A single expense or revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashEntry {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub category: String,
    pub notes: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
