//! # Notifications
//!
//! Transient user-facing messages ("Tenant created", "Network error. Check your connection.")
//! emitted by the effect workers after a command settles. Notifications are a side channel:
//! they are never stored in [`ResourceState`](crate::ResourceState) and cannot fail a command.
//!
//! A [`Notifier`] is injected into each resource through its
//! [`SyncContext`](crate::SyncContext). [`GlobalNotifier`] forwards to a process-wide sink
//! that the UI shell installs once with [`install_global_sink`].

use serde::Serialize;
use std::fmt::{self, Display};
use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Info => f.write_str("info"),
            NotificationKind::Success => f.write_str("success"),
            NotificationKind::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

/// Receives notifications. Implementations must not block.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, message: &str, kind: NotificationKind);
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        trace!(%kind, message, "Notification dropped");
    }
}

/// Fans notifications out to any number of subscribers (toast area, logs, tests).
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        // No subscribers is not an error; the toast area may not be mounted yet.
        let _ = self.sender.send(Notification {
            message: message.to_string(),
            kind,
        });
    }
}

static GLOBAL_SINK: OnceLock<Arc<dyn Notifier>> = OnceLock::new();

/// Installs the process-wide notification sink. Returns `false` if one is already set.
pub fn install_global_sink(sink: Arc<dyn Notifier>) -> bool {
    GLOBAL_SINK.set(sink).is_ok()
}

/// Forwards to the sink installed with [`install_global_sink`]; drops notifications
/// until one is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalNotifier;

impl Notifier for GlobalNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        match GLOBAL_SINK.get() {
            Some(sink) => sink.notify(message, kind),
            None => trace!(%kind, message, "No notification sink installed"),
        }
    }
}
