//! # Totals Calculator
//!
//! Stateless recomputation of a document's derived amounts. Runs after every
//! draft line mutation and once more at commit.
//!
//! ```text
//!  lines ──► subtotal = Σ line_total
//!                │
//!  tax flag ──►  tax = subtotal × 15%  (or 0)
//!                │
//!                total = subtotal + tax
//!                │
//!  paid ──────►  remaining = total − paid   (negative on overpayment)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::DocumentLine;
use crate::FLAT_TAX_RATE;

/// The four derived amounts of a document or draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub remaining: Money,
}

impl Totals {
    /// Computes totals for `lines`. Never fails; an empty list yields zeros
    /// (and `remaining == -paid`).
    pub fn compute(lines: &[DocumentLine], tax_applied: bool, paid: Money) -> Self {
        let subtotal = lines
            .iter()
            .fold(Money::zero(), |sum, line| sum.saturating_add(line.line_total));
        let tax = if tax_applied {
            subtotal.calculate_tax(FLAT_TAX_RATE)
        } else {
            Money::zero()
        };
        let total = subtotal + tax;

        Totals {
            subtotal,
            tax,
            total,
            remaining: total - paid,
        }
    }
}
