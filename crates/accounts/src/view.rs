//! Per-surface capability binding.

use std::sync::{Arc, Mutex};

use carecircle_auth::{Action, AuthzError, Capabilities, authorize, resolve};
use carecircle_events::{SessionBus, Subscription, Topic};
use carecircle_session::SessionStore;

/// A mounted surface's live capability gate.
///
/// On construction the binding resolves once and subscribes to all three
/// session topics; every notice re-reads the store and re-resolves, so the
/// cached set is never stale past the notice that invalidated it. Dropping
/// the binding unsubscribes, which keeps a destroyed surface from acting on
/// later notices and keeps remounts from accumulating duplicate handlers.
#[derive(Debug)]
pub struct ViewBinding {
    name: String,
    caps: Arc<Mutex<Capabilities>>,
    _subscriptions: Vec<Subscription>,
}

impl ViewBinding {
    pub(crate) fn new(name: String, store: SessionStore, bus: &SessionBus) -> Self {
        let caps = Arc::new(Mutex::new(resolve(&store.read())));

        let subscriptions = [
            Topic::PermissionsChanged,
            Topic::UserLoggedIn,
            Topic::StorageChanged,
        ]
        .into_iter()
        .map(|topic| {
            let caps = Arc::clone(&caps);
            let store = store.clone();
            bus.subscribe(topic, move |_| {
                let next = resolve(&store.read());
                if let Ok(mut current) = caps.lock() {
                    *current = next;
                }
            })
        })
        .collect();

        Self {
            name,
            caps,
            _subscriptions: subscriptions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current capability set. Falls back to read-only if the cached
    /// slot is unreadable.
    pub fn capabilities(&self) -> Capabilities {
        self.caps
            .lock()
            .map(|caps| *caps)
            .unwrap_or_else(|_| Capabilities::read_only())
    }

    /// Gate an action attempt on this surface.
    pub fn authorize(&self, action: Action) -> Result<(), AuthzError> {
        authorize(&self.capabilities(), action)
    }
}
