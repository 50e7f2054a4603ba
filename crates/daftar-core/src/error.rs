//! # Error Types
//!
//! Domain-specific error types for daftar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  daftar-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  daftar-db errors (separate crate)                                     │
//! │  └── DbError          - Persistence failures                           │
//! │                                                                         │
//! │  daftar-engine errors                                                   │
//! │  └── EngineError      - What the UI layer sees                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Notification        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant except [`CoreError::MalformedRecord`] is a user-facing
//! warning: it is raised before anything is mutated.

use thiserror::Error;

use crate::types::{CashKind, DocumentKind, EntityType, PartyKind};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Item id is not in the active repository.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Customer or supplier id is not in its repository.
    #[error("{kind} not found: {id}")]
    PartyNotFound { kind: PartyKind, id: String },

    /// No committed document with this id in the book.
    #[error("{kind} not found: {id}")]
    DocumentNotFound { kind: DocumentKind, id: String },

    /// Not enough stock to cover a sale line, or to reverse a purchase.
    ///
    /// ## User Workflow
    /// ```text
    /// Add line (qty: 12)
    ///      │
    ///      ▼
    /// Check stock: available=6
    ///      │
    ///      ▼
    /// InsufficientStock { item: "Widget", available: 6, requested: 12 }
    ///      │
    ///      ▼
    /// UI warns, draft unchanged
    /// ```
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// Line index outside the draft.
    #[error("Line {index} does not exist (draft has {len} lines)")]
    LineOutOfRange { index: usize, len: usize },

    /// No expense or revenue with this id.
    #[error("{kind} not found: {id}")]
    CashEntryNotFound { kind: CashKind, id: String },

    /// A record with this id is already present.
    #[error("{entity} with id {id} already exists")]
    DuplicateId { entity: EntityType, id: String },

    /// No tombstone with this id.
    #[error("Deleted record not found: {0}")]
    TombstoneNotFound(String),

    /// A stored record could not be decoded.
    #[error("Malformed {entity} record: {reason}")]
    MalformedRecord { entity: String, reason: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for errors caused by the user's input or the current state of the
    /// books, as opposed to corrupted data.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, CoreError::MalformedRecord { .. })
    }

    pub fn malformed(entity: impl Into<String>, reason: impl ToString) -> Self {
        CoreError::MalformedRecord {
            entity: entity.into(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (phone, email, date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value above the largest accepted one.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: String },

    /// A list that needs at least one entry is empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    /// Duplicate value (names are unique per repository).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }

    pub fn must_not_be_negative(field: impl Into<String>) -> Self {
        ValidationError::MustNotBeNegative {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn too_large(field: impl Into<String>, max: impl ToString) -> Self {
        ValidationError::TooLarge {
            field: field.into(),
            max: max.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        ValidationError::Duplicate {
            field: field.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
