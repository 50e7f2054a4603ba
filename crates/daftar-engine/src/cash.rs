//! Expenses and revenues.

use daftar_core::{CashEntry, CashInput, CashKind, CoreError};
use tracing::info;

use crate::books::Books;
use crate::error::EngineResult;
use crate::ports::ConfirmRequest;
use crate::state::Collection;

impl Books {
    pub async fn add_cash_entry(
        &mut self,
        kind: CashKind,
        input: CashInput,
    ) -> EngineResult<CashEntry> {
        let result = self.add_cash_entry_inner(kind, input).await;
        self.finish(result, |entry| {
            Some(format!(
                "{} {} recorded ({})",
                kind,
                entry.description,
                self.config.format_amount(entry.amount)
            ))
        })
    }

    async fn add_cash_entry_inner(
        &mut self,
        kind: CashKind,
        input: CashInput,
    ) -> EngineResult<CashEntry> {
        let snapshot = self.state.clone();
        let entry = self.state.cash_mut(kind).add(input)?.clone();
        self.persist(snapshot, &[Collection::cash(kind)]).await?;

        info!(kind = %kind, entry_id = %entry.id, amount = %entry.amount, "Cash entry added");
        Ok(entry)
    }

    pub async fn update_cash_entry(
        &mut self,
        kind: CashKind,
        id: &str,
        input: CashInput,
    ) -> EngineResult<CashEntry> {
        let result = self.update_cash_entry_inner(kind, id, input).await;
        self.finish(result, |entry| {
            Some(format!("{} {} updated", kind, entry.description))
        })
    }

    async fn update_cash_entry_inner(
        &mut self,
        kind: CashKind,
        id: &str,
        input: CashInput,
    ) -> EngineResult<CashEntry> {
        let snapshot = self.state.clone();
        let entry = self.state.cash_mut(kind).update(id, input)?.clone();
        self.persist(snapshot, &[Collection::cash(kind)]).await?;

        info!(kind = %kind, entry_id = %entry.id, "Cash entry updated");
        Ok(entry)
    }

    /// Deletes an entry after confirmation. `Ok(None)` when declined.
    pub async fn delete_cash_entry(
        &mut self,
        kind: CashKind,
        id: &str,
    ) -> EngineResult<Option<CashEntry>> {
        let result = self.delete_cash_entry_inner(kind, id).await;
        self.finish(result, |deleted| {
            deleted
                .as_ref()
                .map(|entry| format!("{} {} deleted", kind, entry.description))
        })
    }

    async fn delete_cash_entry_inner(
        &mut self,
        kind: CashKind,
        id: &str,
    ) -> EngineResult<Option<CashEntry>> {
        let description = self
            .state
            .cash(kind)
            .get(id)
            .map(|entry| entry.description.clone())
            .ok_or_else(|| CoreError::CashEntryNotFound {
                kind,
                id: id.to_string(),
            })?;

        if !self.confirm(ConfirmRequest::delete(kind, &description)).await {
            return Ok(None);
        }

        let snapshot = self.state.clone();
        let removed = self.state.cash_mut(kind).remove(id)?;
        self.persist(snapshot, &[Collection::cash(kind)]).await?;

        info!(kind = %kind, entry_id = %id, "Cash entry deleted");
        Ok(Some(removed))
    }
}
