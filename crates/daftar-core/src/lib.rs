//! # daftar-core: Pure Bookkeeping Logic
//!
//! The invoice–inventory consistency rules as pure functions and in-memory
//! structures. Nothing here performs I/O; the engine crate owns persistence
//! and collaborators.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Daftar Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI layer (external)                          │   │
//! │  │    forms, tables, confirmation dialogs, toasts                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    daftar-engine (Books)                        │   │
//! │  │    commit / edit / delete, rename, soft delete, config          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ daftar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   repository   totals    draft     stock    cascade  tombstone  │   │
//! │  │   documents    cashbook  catalog   validation  money   types    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                daftar-db (Persistence Gateway)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use daftar_core::{Draft, DocumentKind, EntityType, Item, ItemRepository, Money};
//!
//! let mut items = ItemRepository::new();
//! items
//!     .insert(
//!         EntityType::Item,
//!         Item {
//!             id: "1".into(),
//!             code: "IT001".into(),
//!             name: "Widget".into(),
//!             cost: Money::from_major(30),
//!             price: Money::from_major(50),
//!             stock: 10,
//!         },
//!     )
//!     .unwrap();
//!
//! let mut draft = Draft::new(DocumentKind::Sale);
//! draft.add_line(&items, "1", 4, Money::from_major(50)).unwrap();
//! draft.set_tax_applied(true);
//!
//! let totals = draft.totals();
//! assert_eq!(totals.subtotal, Money::from_major(200));
//! assert_eq!(totals.total, Money::from_major(230));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cascade;
pub mod cashbook;
pub mod catalog;
pub mod documents;
pub mod draft;
pub mod error;
pub mod money;
pub mod repository;
pub mod stock;
pub mod tombstone;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cascade::rename_cascade;
pub use cashbook::{CashBook, CashInput};
pub use catalog::{ItemInput, PartyInput};
pub use documents::{DocumentBook, Sequences};
pub use draft::Draft;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use repository::{ItemRepository, PartyRepository, Record, Registry};
pub use stock::{apply_stock_delta, reverse_stock_delta, StockDirection, StockReport};
pub use tombstone::{Tombstone, TombstoneStore};
pub use totals::Totals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// The single flat tax applied to documents with `tax_applied`: 15%.
pub const FLAT_TAX_RATE: TaxRate = TaxRate::from_bps(1500);

/// Business code prefix for items, `IT001`.
pub const ITEM_CODE_PREFIX: &str = "IT";
