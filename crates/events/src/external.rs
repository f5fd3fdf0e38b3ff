//! Cross-context change notification.
//!
//! Models the signal a browsing context receives when a sibling context
//! (another tab or window over the same durable store) mutates session
//! state. Delivery is queued and asynchronous; the originating context is
//! excluded, and two contexts may briefly disagree until the watcher's
//! queue is drained. That window is part of the contract, not a bug.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, mpsc};
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::topic::{Notice, Topic};

/// Identity of one browsing context attached to the shared store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ContextId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    /// Notify failed due to internal lock poisoning.
    #[error("cross-context peer list lock poisoned")]
    Poisoned,
}

#[derive(Debug)]
struct Peer {
    context: ContextId,
    tx: mpsc::Sender<Notice>,
}

/// Fan-out channel connecting the contexts that share one durable store.
///
/// - Queued delivery; receivers observe the change on their next drain
/// - The origin context never receives its own notification
/// - Dead watchers are dropped while notifying
#[derive(Debug, Default)]
pub struct CrossContextChannel {
    peers: Mutex<Vec<Peer>>,
    seq: AtomicU64,
}

impl CrossContextChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a context and receive its watcher.
    pub fn attach(&self, context: ContextId) -> ContextWatcher {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut peers) = self.peers.lock() {
            peers.push(Peer { context, tx });
        }
        ContextWatcher {
            context,
            receiver: rx,
        }
    }

    /// Queue a storage-change notice to every attached context except the
    /// origin.
    pub fn notify(&self, origin: ContextId) -> Result<(), ChannelError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let notice = Notice::new(Topic::StorageChanged, seq);

        let mut peers = self.peers.lock().map_err(|_| ChannelError::Poisoned)?;
        peers.retain(|peer| peer.context == origin || peer.tx.send(notice).is_ok());
        Ok(())
    }

    /// Number of attached contexts still reachable.
    pub fn peer_count(&self) -> usize {
        self.peers.lock().map(|peers| peers.len()).unwrap_or(0)
    }
}

/// Receiving end of the cross-context channel for one context.
#[derive(Debug)]
pub struct ContextWatcher {
    context: ContextId,
    receiver: mpsc::Receiver<Notice>,
}

impl ContextWatcher {
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Block until the next notice is available.
    pub fn recv(&self) -> Result<Notice, mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a notice without blocking.
    pub fn try_recv(&self) -> Result<Notice, mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a notice.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Notice, mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain every queued notice, returning how many were pending.
    pub fn drain(&self) -> usize {
        let mut count = 0;
        while self.try_recv().is_ok() {
            count += 1;
        }
        count
    }
}
