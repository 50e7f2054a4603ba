//! # Cash Book
//!
//! Expenses and revenues: dated amounts with a description and a category.
//! They do not touch stock or parties.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CashEntry, CashKind};
use crate::validation;

/// Category used when none is given.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Form input for an expense or revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashInput {
    pub date: Option<NaiveDate>,
    pub description: String,
    pub amount: Money,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl CashInput {
    /// Validates the input and builds an entry with the given id.
    pub fn into_entry(self, id: String) -> CoreResult<CashEntry> {
        let date = self.date.ok_or_else(|| ValidationError::required("date"))?;
        let description = validation::validate_name("description", &self.description)?;
        validation::validate_cash_amount(self.amount)?;

        Ok(CashEntry {
            id,
            date,
            description,
            amount: self.amount,
            category: validation::optional_text(self.category.as_deref())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            notes: validation::optional_text(self.notes.as_deref()).unwrap_or_default(),
        })
    }
}

/// Entries of one [`CashKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashBook {
    kind: CashKind,
    entries: Vec<CashEntry>,
}

impl CashBook {
    pub fn new(kind: CashKind) -> Self {
        CashBook {
            kind,
            entries: Vec::new(),
        }
    }

    pub fn with_entries(kind: CashKind, entries: Vec<CashEntry>) -> Self {
        CashBook { kind, entries }
    }

    pub fn kind(&self) -> CashKind {
        self.kind
    }

    pub fn add(&mut self, input: CashInput) -> CoreResult<&CashEntry> {
        let entry = input.into_entry(Uuid::new_v4().to_string())?;
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn update(&mut self, id: &str, input: CashInput) -> CoreResult<&CashEntry> {
        let index = self.position(id)?;
        self.entries[index] = input.into_entry(id.to_string())?;
        Ok(&self.entries[index])
    }

    pub fn remove(&mut self, id: &str) -> CoreResult<CashEntry> {
        let index = self.position(id)?;
        Ok(self.entries.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&CashEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Sum of all amounts.
    pub fn total(&self) -> Money {
        self.entries.iter().map(|e| e.amount).sum()
    }

    pub fn as_slice(&self) -> &[CashEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: &str) -> CoreResult<usize> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CoreError::CashEntryNotFound {
                kind: self.kind,
                id: id.to_string(),
            })
    }
}
