// # Notifier Trait
//
// Fire-and-forget channel for user-visible messages (load failures, save
// outcomes). Presentation is entirely up to the implementation.

use serde::{Deserialize, Serialize};

use crate::config::NotificationMode;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A user-visible message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub mode: NotificationMode,
}

impl Notification {
    /// Create a new notification
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        mode: NotificationMode,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
            mode,
        }
    }
}

/// Trait for notification sinks
///
/// `notify` must not block and its outcome is never consumed.
pub trait Notifier: Send + Sync {
    /// Deliver a notification
    fn notify(&self, notification: Notification);
}

/// Notifier that writes notifications to the `tracing` log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => tracing::error!(
                title = %notification.title,
                "{}",
                notification.message
            ),
            Severity::Success | Severity::Info => tracing::info!(
                title = %notification.title,
                "{}",
                notification.message
            ),
        }
    }
}
