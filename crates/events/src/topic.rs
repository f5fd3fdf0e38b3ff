//! Notification topics and the signal they carry.

use chrono::{DateTime, Utc};

/// The three signals session consumers react to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Session-derived permission flags were updated.
    PermissionsChanged,
    /// A new session was established.
    UserLoggedIn,
    /// The durable store was mutated from a different browsing context.
    StorageChanged,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::PermissionsChanged => "permissionsChanged",
            Topic::UserLoggedIn => "userLoggedIn",
            Topic::StorageChanged => "storage",
        }
    }
}

impl core::fmt::Display for Topic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ephemeral signal meaning "session state may have changed".
///
/// Carries no session data. Consumers must re-read the store on receipt;
/// the sequence number and timestamp exist for ordering and diagnostics,
/// never as a substitute for the store's contents.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Notice {
    pub topic: Topic,
    pub seq: u64,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(topic: Topic, seq: u64) -> Self {
        Self {
            topic,
            seq,
            at: Utc::now(),
        }
    }
}
