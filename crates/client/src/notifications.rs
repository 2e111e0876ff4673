//! User-facing notification queue.
//!
//! Messages are appended by stores and views and removed by the view layer.
//! A long-lived view dismisses them explicitly ([`NotificationStore::dismiss`])
//! or once they outlive the configured TTL
//! ([`NotificationStore::dismiss_expired`]). A one-shot view such as the
//! `scuff` CLI prints each message exactly once through
//! [`NotificationStore::drain`]; that print is its dismissal and the TTL does
//! not apply. Nothing is persisted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::watch;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    /// Short tag used when printing.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub text: String,
    pub raised_at: Instant,
}

/// Ordered collection of active notifications.
///
/// Cheap to clone; all clones share one queue.
#[derive(Debug, Clone)]
pub struct NotificationStore {
    inner: Arc<NotificationStoreInner>,
}

#[derive(Debug)]
struct NotificationStoreInner {
    active: watch::Sender<Vec<Notification>>,
    next_id: AtomicU64,
    ttl: Duration,
}

impl NotificationStore {
    /// Create an empty store whose messages expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let (active, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(NotificationStoreInner {
                active,
                next_id: AtomicU64::new(1),
                ttl,
            }),
        }
    }

    /// Configured lifetime of a message.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Append a success message.
    pub fn show_success(&self, text: impl Into<String>) -> u64 {
        self.push(NotificationKind::Success, text.into())
    }

    /// Append a warning message.
    pub fn show_warning(&self, text: impl Into<String>) -> u64 {
        self.push(NotificationKind::Warning, text.into())
    }

    /// Append an error message.
    pub fn show_error(&self, text: impl Into<String>) -> u64 {
        self.push(NotificationKind::Error, text.into())
    }

    fn push(&self, kind: NotificationKind, text: String) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(id, kind = kind.tag(), %text, "notification raised");
        self.inner.active.send_modify(|active| {
            active.push(Notification {
                id,
                kind,
                text,
                raised_at: Instant::now(),
            });
        });
        id
    }

    /// Snapshot of the active messages, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<Notification> {
        self.inner.active.borrow().clone()
    }

    /// Remove one message. Returns whether it was present.
    pub fn dismiss(&self, id: u64) -> bool {
        self.inner.active.send_if_modified(|active| {
            let before = active.len();
            active.retain(|n| n.id != id);
            active.len() != before
        })
    }

    /// Remove every message older than the TTL as of `now`.
    pub fn dismiss_expired(&self, now: Instant) -> usize {
        let ttl = self.inner.ttl;
        let mut removed = 0;
        self.inner.active.send_if_modified(|active| {
            let before = active.len();
            active.retain(|n| now.saturating_duration_since(n.raised_at) < ttl);
            removed = before - active.len();
            removed > 0
        });
        removed
    }

    /// Take every message, leaving the queue empty. One-shot views call
    /// this instead of dismissing by id or age.
    pub fn drain(&self) -> Vec<Notification> {
        let mut drained = Vec::new();
        self.inner.active.send_if_modified(|active| {
            drained = std::mem::take(active);
            !drained.is_empty()
        });
        drained
    }

    /// Watch the active messages.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.inner.active.subscribe()
    }
}
