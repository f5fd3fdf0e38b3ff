//! Synchronous in-process observer bus.
//!
//! `publish` runs every currently registered subscriber on the calling turn
//! before returning, in registration order. Delivery is best-effort with no
//! persistence and no replay; a subscriber registered after a publish never
//! sees that notice.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use thiserror::Error;

use crate::topic::{Notice, Topic};

type Handler = Arc<dyn Fn(&Notice) + Send + Sync>;

#[derive(Debug, Error)]
pub enum BusError {
    /// Publish failed due to internal lock poisoning.
    #[error("bus subscriber list lock poisoned")]
    Poisoned,
}

struct Entry {
    id: u64,
    topic: Topic,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
    seq: AtomicU64,
}

/// In-process pub/sub bus for session notifications.
///
/// - No IO / no async
/// - Synchronous fan-out in registration order
/// - Handlers run outside the subscriber lock, so a handler may publish or
///   subscribe without deadlocking
#[derive(Clone, Default)]
pub struct SessionBus {
    inner: Arc<BusInner>,
}

impl core::fmt::Debug for SessionBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionBus")
            .field("seq", &self.inner.seq.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl SessionBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `topic`.
    ///
    /// The returned guard unsubscribes on drop; every consumer must hold it
    /// for exactly as long as it wants deliveries, which rules out both
    /// handler leaks and duplicate registrations across remounts.
    pub fn subscribe(
        &self,
        topic: Topic,
        handler: impl Fn(&Notice) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        // If the lock is poisoned the subscription is inert; it will simply
        // never be invoked.
        if let Ok(mut entries) = self.inner.entries.lock() {
            entries.push(Entry {
                id,
                topic,
                handler: Arc::new(handler),
            });
        }

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Publish a notice on `topic` to every current subscriber.
    ///
    /// The subscriber set is snapshotted under the lock, then handlers run
    /// with the lock released.
    pub fn publish(&self, topic: Topic) -> Result<(), BusError> {
        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let notice = Notice::new(topic, seq);

        let handlers: Vec<Handler> = {
            let entries = self.inner.entries.lock().map_err(|_| BusError::Poisoned)?;
            entries
                .iter()
                .filter(|entry| entry.topic == topic)
                .map(|entry| Arc::clone(&entry.handler))
                .collect()
        };

        for handler in handlers {
            handler(&notice);
        }
        Ok(())
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .entries
            .lock()
            .map(|entries| entries.iter().filter(|e| e.topic == topic).count())
            .unwrap_or(0)
    }
}

/// Guard tying a subscription's lifetime to its holder.
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Explicit unsubscribe; equivalent to dropping the guard.
    pub fn unsubscribe(self) {}
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            if let Ok(mut entries) = inner.entries.lock() {
                entries.retain(|entry| entry.id != self.id);
            }
        }
    }
}
