//! Last-request-wins retention of list pages per browser session.
//!
//! Every list load takes a [`Ticket`] before calling the backend. When the
//! response arrives it may only replace the retained listing if no newer
//! ticket was issued for the same session in the meantime, so a slow,
//! superseded response never overwrites a newer one. The retained listing is
//! what a page falls back to when a later load fails.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::models::ChannelId;

/// Proof of having started a list load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    channel: ChannelId,
    seq: u64,
}

#[derive(Debug)]
struct Slot<T> {
    issued: u64,
    value: Option<T>,
    touched: Instant,
}

/// Retained list views keyed by browser session.
#[derive(Debug)]
pub struct ListViews<T> {
    slots: Arc<Mutex<HashMap<ChannelId, Slot<T>>>>,
}

impl<T> Clone for ListViews<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<T> Default for ListViews<T> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Clone> ListViews<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChannelId, Slot<T>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a load for `channel`, superseding any load still in flight.
    pub fn begin(&self, channel: ChannelId) -> Ticket {
        let mut slots = self.lock();
        let slot = slots.entry(channel).or_insert_with(|| Slot {
            issued: 0,
            value: None,
            touched: Instant::now(),
        });
        slot.issued += 1;
        slot.touched = Instant::now();
        Ticket {
            channel,
            seq: slot.issued,
        }
    }

    /// Store `value` as the session's listing if `ticket` is still current.
    ///
    /// Returns `false` (and discards `value`) for a superseded ticket.
    pub fn commit(&self, ticket: &Ticket, value: T) -> bool {
        let mut slots = self.lock();
        match slots.get_mut(&ticket.channel) {
            Some(slot) if slot.issued == ticket.seq => {
                slot.value = Some(value);
                slot.touched = Instant::now();
                true
            }
            _ => {
                tracing::debug!(
                    channel = %ticket.channel,
                    seq = ticket.seq,
                    "discarding superseded list response"
                );
                false
            }
        }
    }

    /// The most recently committed listing for `channel`.
    #[must_use]
    pub fn last(&self, channel: ChannelId) -> Option<T> {
        self.lock().get(&channel).and_then(|slot| slot.value.clone())
    }

    /// Drop everything retained for `channel` (logout).
    pub fn forget(&self, channel: ChannelId) {
        self.lock().remove(&channel);
    }

    /// Drop sessions untouched for at least `idle`. Returns how many.
    pub fn prune(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let mut slots = self.lock();
        let before = slots.len();
        slots.retain(|_, slot| now.duration_since(slot.touched) < idle);
        before - slots.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_ticket_wins() {
        let views: ListViews<&str> = ListViews::new();
        let channel = ChannelId::new();

        let slow = views.begin(channel);
        let fast = views.begin(channel);

        assert!(views.commit(&fast, "page 2"));
        assert!(!views.commit(&slow, "page 1"));
        assert_eq!(views.last(channel), Some("page 2"));
    }

    #[test]
    fn test_failed_load_keeps_previous_listing() {
        let views: ListViews<u32> = ListViews::new();
        let channel = ChannelId::new();

        let first = views.begin(channel);
        assert!(views.commit(&first, 1));

        // A later load that fails never commits.
        let _failed = views.begin(channel);
        assert_eq!(views.last(channel), Some(1));
    }

    #[test]
    fn test_sessions_do_not_interfere() {
        let views: ListViews<u32> = ListViews::new();
        let a = ChannelId::new();
        let b = ChannelId::new();

        let ta = views.begin(a);
        let tb = views.begin(b);
        assert!(views.commit(&ta, 1));
        assert!(views.commit(&tb, 2));
        assert_eq!(views.last(a), Some(1));
        assert_eq!(views.last(b), Some(2));

        views.forget(a);
        assert_eq!(views.last(a), None);
        assert!(!views.commit(&ta, 3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_idle_sessions() {
        let views: ListViews<u32> = ListViews::new();
        let idle = ChannelId::new();
        let active = ChannelId::new();
        let t = views.begin(idle);
        views.commit(&t, 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        let fresh = views.begin(active);

        assert_eq!(views.prune(Duration::from_secs(30)), 1);
        assert_eq!(views.last(idle), None);
        assert!(views.commit(&fresh, 2));
        assert_eq!(views.last(active), Some(2));
    }
}
