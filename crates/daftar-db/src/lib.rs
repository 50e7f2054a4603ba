//! # daftar-db: Persistence Gateway for Daftar
//!
//! Durable storage for the bookkeeping collections. Each collection
//! (items, customers, sales, trash, ...) is kept as one JSON snapshot per
//! namespace in a local SQLite database, written through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Daftar Data Flow                                 │
//! │                                                                         │
//! │  Books::commit_draft                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     daftar-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Collection    │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │◄───│  Repository    │   │  (embedded)  │   │   │
//! │  │   │  SqlitePool   │    │  load / save   │   │ 001_collec.. │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  │           ▲                                                     │   │
//! │  │           └──── CollectionStore (store.rs, the engine's port)  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/com.daftar.books/daftar.db                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use daftar_db::{CollectionStore, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("daftar.db")).await?;
//! let items = db.load("shop-1", "items").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::collection::{CollectionRepository, CollectionWrite};
pub use store::CollectionStore;
