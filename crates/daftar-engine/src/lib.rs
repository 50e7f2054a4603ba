//! # daftar-engine: Composition Root for Daftar
//!
//! Owns the open books of one business activity and keeps documents, stock
//! and name snapshots consistent with each other and with storage.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            UI layer                                     │
//! │        forms  ·  tables  ·  dialogs (ConfirmationGate)  ·  toasts       │
//! └───────────────────────────────┬─────────────────────────────────────────┘
//!                                 │ &mut Books
//! ┌───────────────────────────────▼─────────────────────────────────────────┐
//! │                               Books                                     │
//! │                                                                         │
//! │  commit    drafts, create / edit / delete of sales and purchases        │
//! │  catalog   items and parties, rename cascade, soft delete, restore      │
//! │  cash      expenses and revenues                                        │
//! │                                                                         │
//! │  LedgerState (in memory) ── snapshot / restore on failed writes         │
//! └───────┬───────────────────────────┬─────────────────────────┬───────────┘
//!         │                           │                         │
//!   daftar-core rules        CollectionStore (db)       NotificationSink
//! ```
//!
//! ## Module Organization
//! - [`books`] - `Books`, its builder and the shared mutation plumbing
//! - [`config`] - TOML configuration with environment overrides
//! - [`error`] - Engine and configuration errors
//! - [`ports`] - Confirmation and notification collaborators
//! - [`state`] - In-memory collections and their stored form
//! - [`telemetry`] - `tracing` subscriber bootstrap
//!
//! ## Usage
//!
//! ```rust,ignore
//! use daftar_core::{DocumentKind, Money};
//! use daftar_engine::{init_tracing, Books, EngineConfig};
//!
//! init_tracing();
//! let config = EngineConfig::load_or_default(None);
//! let mut books = Books::open_with_config(config).await?;
//!
//! let mut draft = books.new_draft(DocumentKind::Sale);
//! draft.set_date(today);
//! draft.set_party(customer_id);
//! books.add_line(&mut draft, &item_id, 4, Money::from_major(50))?;
//! let sale = books.commit_draft(&draft).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod books;
pub mod config;
pub mod error;
pub mod ports;
pub mod state;
pub mod telemetry;

mod cash;
mod catalog;
mod commit;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use books::{Books, BooksBuilder, PendingRename};
pub use catalog::RecordUpdate;
pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, EngineResult};
pub use ports::{
    AutoConfirm, ConfirmRequest, ConfirmationGate, NoOpNotifier, Notification, NotificationSink,
    NotifyLevel,
};
pub use state::{Collection, LedgerState};
pub use telemetry::init_tracing;
