//! # Engine Error Types
//!
//! What the UI layer receives from [`Books`](crate::Books).
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Engine Error Categories                           │
//! │                                                                         │
//! │  ┌──────────────────────┐  ┌────────────────────┐  ┌────────────────┐  │
//! │  │  Warning (user)      │  │  Error (fault)     │  │  Setup         │  │
//! │  │                      │  │                    │  │                │  │
//! │  │  Core(validation)    │  │  PersistenceFailed │  │  Config        │  │
//! │  │  Core(not found)     │  │  Corrupt           │  │  Storage       │  │
//! │  │  Core(stock)         │  │  Core(malformed)   │  │                │  │
//! │  └──────────────────────┘  └────────────────────┘  └────────────────┘  │
//! │                                                                         │
//! │  Warnings are raised before anything is mutated. Faults leave the      │
//! │  books exactly as they were before the operation.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use daftar_core::{CoreError, ValidationError};
use daftar_db::DbError;
use thiserror::Error;

use crate::ports::{Notification, NotifyLevel};

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store did not accept the write. In-memory state was restored.
    #[error("Could not save {collections}: {source}")]
    PersistenceFailed {
        collections: String,
        #[source]
        source: DbError,
    },

    /// A stored collection could not be decoded on load.
    #[error("Stored {collection} collection is corrupt: {reason}")]
    Corrupt { collection: String, reason: String },

    /// The store could not be reached while loading.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

impl EngineError {
    /// True when the books were left untouched because of the user's input.
    pub fn is_user_error(&self) -> bool {
        match self {
            EngineError::Core(err) => err.is_user_error(),
            _ => false,
        }
    }

    /// Notification level for the sink.
    pub fn level(&self) -> NotifyLevel {
        if self.is_user_error() {
            NotifyLevel::Warning
        } else {
            NotifyLevel::Error
        }
    }

    /// The notification shown for this error. Faults get a generic message;
    /// their detail goes to the log.
    pub fn to_notification(&self) -> Notification {
        match self {
            EngineError::Core(err) if err.is_user_error() => Notification::warning(err.to_string()),
            EngineError::PersistenceFailed { source, .. } if source.is_retryable() => {
                Notification::error("Could not save changes. Nothing was changed. Try again.")
            }
            EngineError::PersistenceFailed { .. } => {
                Notification::error("Could not save changes. Nothing was changed.")
            }
            EngineError::Config(err) => Notification::error(err.to_string()),
            _ => Notification::error("Something went wrong. The operation was cancelled."),
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading, validating or saving [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Neither a path nor a platform data directory is available.
    #[error("No data directory available for the database")]
    NoDataDir,
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}
