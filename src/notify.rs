//! User-visible notification channel.
//!
//! Recoverable lookup failures (e.g. a missing LP token account) must reach
//! the surrounding UI as a toast, not abort the proposal-creation flow. This
//! module provides the channel the core pushes those notifications into; the
//! rendering layer drains the receiver. Every notification is also logged.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Severity of a notification shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    /// Informational, no action required
    Info,
    /// Something recoverable went wrong (e.g. account lookup failed)
    Error,
}

/// A single user-visible notification (toast content).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Severity level
    pub level: NotificationLevel,
    /// Short message (toast title)
    pub message: String,
    /// Longer description with context (toast body)
    pub description: String,
}

/// Sender half handed to builders and the execution controller.
///
/// Cheap to clone; dropping all receivers turns `notify` into a log-only
/// sink, which is the right behavior for headless tests.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Creates a notifier and the receiver the UI layer should drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Pushes a notification to the UI and logs it.
    ///
    /// Send failures (receiver dropped) are ignored: the log line is the
    /// fallback surface.
    pub fn notify(&self, level: NotificationLevel, message: &str, description: &str) {
        match level {
            NotificationLevel::Info => info!("{}: {}", message, description),
            NotificationLevel::Error => error!("{}: {}", message, description),
        }
        let _ = self.tx.send(Notification {
            level,
            message: message.to_string(),
            description: description.to_string(),
        });
    }

    /// Convenience wrapper for error-level notifications.
    pub fn notify_error(&self, message: &str, description: &str) {
        self.notify(NotificationLevel::Error, message, description);
    }
}
