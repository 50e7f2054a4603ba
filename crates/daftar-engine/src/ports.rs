//! # Collaborator Ports
//!
//! Interfaces the engine calls out to. Each is injected into
//! [`BooksBuilder`](crate::BooksBuilder); leaving one out installs its no-op.
//!
//! | Port | Default | Called |
//! |------|---------|--------|
//! | [`ConfirmationGate`] | [`AutoConfirm`] | before every delete-class operation |
//! | [`NotificationSink`] | [`NoOpNotifier`] | after every user-facing operation |

use async_trait::async_trait;

// =============================================================================
// Confirmation
// =============================================================================

/// What the user is asked before a destructive action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
}

impl ConfirmRequest {
    /// A delete prompt for the named record.
    pub fn delete(what: impl std::fmt::Display, name: impl std::fmt::Display) -> Self {
        ConfirmRequest {
            title: format!("Delete {}", what),
            message: format!("Are you sure you want to delete \"{}\"?", name),
            confirm_label: "Delete".to_string(),
        }
    }
}

/// Asks the user to confirm. Awaited before the operation mutates anything.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, request: &ConfirmRequest) -> bool;
}

/// Approves everything (headless use, tests).
pub struct AutoConfirm;

#[async_trait]
impl ConfirmationGate for AutoConfirm {
    async fn confirm(&self, _request: &ConfirmRequest) -> bool {
        true
    }
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Success,
    Warning,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotifyLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Notification {
            level: NotifyLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notification {
            level: NotifyLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            level: NotifyLevel::Error,
            message: message.into(),
        }
    }
}

/// Fire-and-forget reporting (implemented by the UI integration).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Drops every notification.
pub struct NoOpNotifier;

impl NotificationSink for NoOpNotifier {
    fn notify(&self, _notification: Notification) {}
}
