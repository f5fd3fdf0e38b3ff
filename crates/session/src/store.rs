//! The session store.

use std::sync::Arc;

use anyhow::Context as _;

use carecircle_auth::{AuthToken, Role, Session, UserRecord};
use carecircle_events::{ContextId, CrossContextChannel};

use crate::keys;
use crate::kv::{KeyValueStore, StoreError};

/// Read/write/clear access to the persisted session.
///
/// # Ordering contracts
/// - `write` commits every field before returning, so a caller can publish
///   a change notification knowing no subscriber will observe a partial
///   session.
/// - `clear` removes the token last; see [`keys::CLEAR_ORDER`].
///
/// When built with a [`CrossContextChannel`], every mutation queues a
/// storage-change notice to the other attached contexts, tagged with this
/// store's context id so it never hears its own writes.
#[derive(Debug, Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    context: ContextId,
    external: Option<Arc<CrossContextChannel>>,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            context: ContextId::new(),
            external: None,
        }
    }

    pub fn with_external(mut self, channel: Arc<CrossContextChannel>) -> Self {
        self.external = Some(channel);
        self
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Persist `session`, field by field.
    pub fn write(&self, session: &Session) -> Result<(), StoreError> {
        match &session.token {
            Some(token) => self.kv.set(keys::USER_TOKEN, token.as_str())?,
            None => self.kv.remove(keys::USER_TOKEN)?,
        }
        match &session.user {
            Some(user) => {
                let blob =
                    serde_json::to_string(user).context("failed to serialize user record")?;
                self.kv.set(keys::USER_INFO, &blob)?;
            }
            None => self.kv.remove(keys::USER_INFO)?,
        }
        match &session.role {
            Some(role) => self.kv.set(keys::USER_ROLE, role.as_str())?,
            None => self.kv.remove(keys::USER_ROLE)?,
        }
        self.kv
            .set(keys::IS_CONTRIBUTOR, bool_str(session.is_contributor))?;
        self.kv
            .set(keys::IS_VIEW_ONLY, bool_str(session.is_view_only))?;

        self.notify_external();
        Ok(())
    }

    /// Read the persisted session. Total; never fails.
    ///
    /// Unreadable keys are treated as absent. A present but unparseable
    /// user record degrades the whole read to a token-only session, so a
    /// corrupted blob can never resolve to more than read-only access.
    pub fn read(&self) -> Session {
        let token = self.get_tolerant(keys::USER_TOKEN).map(AuthToken::new);

        if let Some(raw) = self.get_tolerant(keys::USER_INFO) {
            match serde_json::from_str::<UserRecord>(&raw) {
                Ok(user) => {
                    let role = self.get_tolerant(keys::USER_ROLE).map(Role::new);
                    return Session {
                        token,
                        role,
                        user: Some(user),
                        is_contributor: self.read_flag(keys::IS_CONTRIBUTOR),
                        is_view_only: self.read_flag(keys::IS_VIEW_ONLY),
                    };
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        "stored user record is malformed, degrading to token-only session"
                    );
                    return Session {
                        token,
                        ..Session::logged_out()
                    };
                }
            }
        }

        Session {
            token,
            role: self.get_tolerant(keys::USER_ROLE).map(Role::new),
            user: None,
            is_contributor: self.read_flag(keys::IS_CONTRIBUTOR),
            is_view_only: self.read_flag(keys::IS_VIEW_ONLY),
        }
    }

    /// Remove every session key, token last.
    pub fn clear(&self) -> Result<(), StoreError> {
        for key in keys::CLEAR_ORDER {
            self.kv.remove(key)?;
        }
        self.notify_external();
        Ok(())
    }

    fn read_flag(&self, key: &str) -> bool {
        self.get_tolerant(key).as_deref() == Some("true")
    }

    fn get_tolerant(&self, key: &str) -> Option<String> {
        match self.kv.get(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, error = %err, "session store read failed, treating key as absent");
                None
            }
        }
    }

    fn notify_external(&self) {
        if let Some(channel) = &self.external {
            if let Err(err) = channel.notify(self.context) {
                tracing::warn!(error = %err, "cross-context notification failed");
            }
        }
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
