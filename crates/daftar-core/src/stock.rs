//! # Stock Ledger
//!
//! Applies and reverses the quantity deltas implied by a document.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_stock_delta(doc, direction)                                      │
//! │                                                                         │
//! │    Purchase  direction = Inbound  (+1)   stock += qty                   │
//! │    Sale      direction = Outbound (−1)   stock −= qty  (floor 0)        │
//! │                                                                         │
//! │  reverse_stock_delta(doc, direction)                                    │
//! │                                                                         │
//! │    same walk with the opposite sign, NO floor                           │
//! │                                                                         │
//! │  apply ∘ reverse == identity on every referenced item                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The floor on an outbound apply is a safety net. Sale lines are checked
//! against stock before they get here, so [`StockReport::clamped_items`] is
//! expected to stay empty; callers log it when it does not.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::repository::ItemRepository;
use crate::types::{Document, Item};

/// Sign of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDirection {
    /// +1, stock comes in (purchase).
    Inbound,
    /// −1, stock goes out (sale).
    Outbound,
}

impl StockDirection {
    pub const fn sign(self) -> i64 {
        match self {
            StockDirection::Inbound => 1,
            StockDirection::Outbound => -1,
        }
    }

    pub const fn inverse(self) -> Self {
        match self {
            StockDirection::Inbound => StockDirection::Outbound,
            StockDirection::Outbound => StockDirection::Inbound,
        }
    }
}

/// What a ledger walk did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockReport {
    /// Lines whose item was found and adjusted.
    pub touched: usize,
    /// Item ids referenced by lines but absent from the repository.
    pub missing_items: Vec<String>,
    /// Item ids floored at zero by an outbound apply.
    pub clamped_items: Vec<String>,
}

/// Adds `direction × quantity` of every line to its item's stock.
///
/// Outbound movements are floored at zero. Lines referencing items that are
/// no longer in the repository are skipped and listed in the report.
pub fn apply_stock_delta(
    items: &mut ItemRepository,
    document: &Document,
    direction: StockDirection,
) -> StockReport {
    walk(items, document, direction, direction == StockDirection::Outbound)
}

/// Exact inverse of [`apply_stock_delta`] for the same `direction`.
pub fn reverse_stock_delta(
    items: &mut ItemRepository,
    document: &Document,
    direction: StockDirection,
) -> StockReport {
    walk(items, document, direction.inverse(), false)
}

fn walk(
    items: &mut ItemRepository,
    document: &Document,
    direction: StockDirection,
    floor_at_zero: bool,
) -> StockReport {
    let mut report = StockReport::default();

    for line in &document.lines {
        let Some(item) = items.get_mut(&line.item_id) else {
            report.missing_items.push(line.item_id.clone());
            continue;
        };

        let next = item
            .stock
            .saturating_add(direction.sign().saturating_mul(line.quantity));
        if floor_at_zero && next < 0 {
            item.stock = 0;
            report.clamped_items.push(item.id.clone());
        } else {
            item.stock = next;
        }
        report.touched += 1;
    }

    report
}

/// Checks that an outbound movement of `document` is covered by stock.
///
/// Quantities of the same item on several lines are added up. Inbound
/// movements always pass. Unknown items are left to the caller.
pub fn ensure_stock_covers(
    items: &ItemRepository,
    document: &Document,
    direction: StockDirection,
) -> CoreResult<()> {
    if direction == StockDirection::Inbound {
        return Ok(());
    }

    let mut wanted: HashMap<&str, i64> = HashMap::new();
    for line in &document.lines {
        let total = wanted.entry(line.item_id.as_str()).or_default();
        *total = total.saturating_add(line.quantity);
    }

    for line in &document.lines {
        let Some(requested) = wanted.remove(line.item_id.as_str()) else {
            continue;
        };
        if let Some(item) = items.get(&line.item_id) {
            if item.stock < requested {
                return Err(CoreError::InsufficientStock {
                    item: item.name.clone(),
                    available: item.stock,
                    requested,
                });
            }
        }
    }

    Ok(())
}

/// First item among `item_ids` whose stock is below zero.
pub fn find_negative_stock<'r, 'a>(
    items: &'r ItemRepository,
    item_ids: impl IntoIterator<Item = &'a str>,
) -> Option<&'r Item> {
    item_ids
        .into_iter()
        .filter_map(|id| items.get(id))
        .find(|item| item.stock < 0)
}

// =============================================================================
// Unit Tests
// =============================================================================
