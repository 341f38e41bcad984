//! Per-session notification queue rendered as auto-dismissing toasts.
//!
//! Entries are addressed to a browser session's [`ChannelId`]. An entry waits
//! in its channel until a page renders it; its 3000ms lifetime starts at that
//! first render, so a toast published just before a redirect is still seen on
//! the page that follows. Entries nobody renders are dropped after
//! [`UNSHOWN_RETENTION`].

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::models::ChannelId;

/// How long a toast stays visible once rendered.
pub const TOAST_TTL: Duration = Duration::from_millis(3000);

/// How long an entry may wait for its first render.
pub const UNSHOWN_RETENTION: Duration = Duration::from_secs(5 * 60);

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }

    /// Phosphor icon class.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Success => "ph ph-check-circle",
            Self::Error => "ph ph-x-circle",
            Self::Info => "ph ph-info",
        }
    }

    /// Tailwind classes for the toast container.
    #[must_use]
    pub const fn classes(self) -> &'static str {
        match self {
            Self::Success => "bg-green-50 border-green-400 text-green-800",
            Self::Error => "bg-red-50 border-red-400 text-red-800",
            Self::Info => "bg-blue-50 border-blue-400 text-blue-800",
        }
    }
}

/// A toast as handed to templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: String,
    pub message: String,
    pub kind: ToastKind,
    /// Milliseconds until the toast expires, for the client-side timer.
    pub remaining_ms: u64,
}

#[derive(Debug)]
struct Entry {
    id: Uuid,
    message: String,
    kind: ToastKind,
    published_at: Instant,
    shown_at: Option<Instant>,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        match self.shown_at {
            Some(shown) => now.duration_since(shown) >= TOAST_TTL,
            None => now.duration_since(self.published_at) >= UNSHOWN_RETENTION,
        }
    }
}

type Channels = HashMap<ChannelId, VecDeque<Entry>>;

/// Notification broadcaster shared through application state.
#[derive(Clone, Default)]
pub struct Notifier {
    channels: Arc<Mutex<Channels>>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Channels> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a toast for `channel` and return its id.
    pub fn publish(&self, channel: ChannelId, message: impl Into<String>, kind: ToastKind) -> Uuid {
        let id = Uuid::new_v4();
        let message = message.into();
        tracing::debug!(%channel, kind = kind.as_str(), %message, "notification published");
        self.lock().entry(channel).or_default().push_back(Entry {
            id,
            message,
            kind,
            published_at: Instant::now(),
            shown_at: None,
        });
        id
    }

    pub fn success(&self, channel: ChannelId, message: impl Into<String>) -> Uuid {
        self.publish(channel, message, ToastKind::Success)
    }

    pub fn error(&self, channel: ChannelId, message: impl Into<String>) -> Uuid {
        self.publish(channel, message, ToastKind::Error)
    }

    pub fn info(&self, channel: ChannelId, message: impl Into<String>) -> Uuid {
        self.publish(channel, message, ToastKind::Info)
    }

    /// Live toasts for `channel` in insertion order.
    ///
    /// Expired entries are purged first; entries not rendered before start
    /// their lifetime now.
    pub fn display(&self, channel: ChannelId) -> Vec<Toast> {
        let now = Instant::now();
        let mut channels = self.lock();
        let Some(entries) = channels.get_mut(&channel) else {
            return Vec::new();
        };
        entries.retain(|entry| !entry.expired(now));

        let toasts = entries
            .iter_mut()
            .map(|entry| {
                let shown = *entry.shown_at.get_or_insert(now);
                let remaining = TOAST_TTL.saturating_sub(now.duration_since(shown));
                Toast {
                    id: entry.id.to_string(),
                    message: entry.message.clone(),
                    kind: entry.kind,
                    remaining_ms: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
                }
            })
            .collect();

        if entries.is_empty() {
            channels.remove(&channel);
        }
        toasts
    }

    /// Remove one toast before it expires. Returns whether it was present.
    pub fn dismiss(&self, channel: ChannelId, id: Uuid) -> bool {
        let mut channels = self.lock();
        let Some(entries) = channels.get_mut(&channel) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            channels.remove(&channel);
        }
        removed
    }

    /// Purge expired entries and empty channels. Returns entries removed.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.lock().retain(|_, entries| {
            let before = entries.len();
            entries.retain(|entry| !entry.expired(now));
            removed += before - entries.len();
            !entries.is_empty()
        });
        removed
    }

    /// Number of channels holding at least one entry.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.lock().len()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("channels", &self.channel_count())
            .finish()
    }
}

/// Spawn a task pruning `notifier` every `period`.
#[must_use]
pub fn spawn_pruner(notifier: Notifier, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = notifier.prune();
            if removed > 0 {
                tracing::debug!(removed, "pruned expired notifications");
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_error_toast_expires_after_ttl() {
        let notifier = Notifier::new();
        let channel = ChannelId::new();
        notifier.error(channel, "Failed to load enquiries");

        let shown = notifier.display(channel);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].kind, ToastKind::Error);
        assert_eq!(shown[0].message, "Failed to load enquiries");
        assert_eq!(shown[0].remaining_ms, 3000);

        tokio::time::advance(Duration::from_millis(2999)).await;
        let still = notifier.display(channel);
        assert_eq!(still.len(), 1);
        assert_eq!(still[0].remaining_ms, 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(notifier.display(channel).is_empty());
        assert_eq!(notifier.channel_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrendered_toast_waits_for_first_display() {
        let notifier = Notifier::new();
        let channel = ChannelId::new();
        notifier.success(channel, "Login successful!");

        tokio::time::advance(Duration::from_secs(10)).await;
        let shown = notifier.display(channel);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].remaining_ms, 3000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrendered_toast_dropped_after_retention() {
        let notifier = Notifier::new();
        let channel = ChannelId::new();
        notifier.info(channel, "abandoned");

        tokio::time::advance(UNSHOWN_RETENTION).await;
        assert_eq!(notifier.prune(), 1);
        assert!(notifier.display(channel).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_insertion_order_and_dismiss() {
        let notifier = Notifier::new();
        let channel = ChannelId::new();
        let first = notifier.success(channel, "one");
        notifier.error(channel, "two");
        notifier.info(channel, "three");

        let messages: Vec<_> = notifier
            .display(channel)
            .into_iter()
            .map(|t| t.message)
            .collect();
        assert_eq!(messages, vec!["one", "two", "three"]);

        assert!(notifier.dismiss(channel, first));
        assert!(!notifier.dismiss(channel, first));
        assert_eq!(notifier.display(channel).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_channels_are_isolated() {
        let notifier = Notifier::new();
        let alice = ChannelId::new();
        let bob = ChannelId::new();
        notifier.success(alice, "for alice");

        assert!(notifier.display(bob).is_empty());
        assert_eq!(notifier.display(alice).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pruner_task_purges_expired() {
        let notifier = Notifier::new();
        let channel = ChannelId::new();
        notifier.success(channel, "done");
        notifier.display(channel);

        let handle = spawn_pruner(notifier.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(notifier.channel_count(), 0);
        handle.abort();
    }
}
