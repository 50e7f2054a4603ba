//! # Repository Module
//!
//! Database repository implementations for Daftar.
//!
//! ```text
//! Books::persist
//!      │  db.collections().save_batch("shop-1", writes)
//!      ▼
//! CollectionRepository
//! ├── load(namespace, name)
//! ├── save(namespace, name, payload)
//! ├── save_batch(namespace, writes)   ← one transaction
//! ├── names(namespace)                ← daftar-seed: skip populated namespaces
//! └── delete_namespace(namespace)     ← daftar-seed --reset
//!      │
//!      ▼
//! SQLite `collections` table
//! ```

pub mod collection;
