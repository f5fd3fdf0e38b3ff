//! Session orchestration.

use std::sync::Arc;

use thiserror::Error;

use carecircle_auth::{
    AuthToken, Capabilities, RouteDecision, Session, UserRecord, decide, resolve,
};
use carecircle_core::DomainError;
use carecircle_events::{BusError, ContextWatcher, SessionBus, Topic};
use carecircle_session::{SessionStore, StoreError};

use crate::api::{ApiClient, ApiError};
use crate::view::ViewBinding;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("directory state lock poisoned")]
    Poisoned,
}

/// Orchestrates the account flows.
///
/// Every flow follows the same ordering contract: the service call
/// completes, the session store commits every field, and only then does the
/// bus publish. A subscriber running synchronously on the publish therefore
/// always observes a fully updated session. A failed service call leaves
/// the store untouched.
#[derive(Debug, Clone)]
pub struct SessionManager {
    pub(crate) api: Arc<dyn ApiClient>,
    pub(crate) store: SessionStore,
    pub(crate) bus: SessionBus,
}

impl SessionManager {
    pub fn new(api: Arc<dyn ApiClient>, store: SessionStore, bus: SessionBus) -> Self {
        Self { api, store, bus }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn bus(&self) -> &SessionBus {
        &self.bus
    }

    /// Authenticate and establish a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AccountError> {
        let response = self.api.authenticate(email, password).await?;
        let session = Session::from_login(AuthToken::new(response.token), response.user);
        self.store.write(&session)?;
        self.bus.publish(Topic::UserLoggedIn)?;
        tracing::info!(role = ?session.role, "session established");
        Ok(session)
    }

    /// Redeem an invite token and establish a session for the invited user.
    pub async fn accept_invite(&self, invite_token: &str) -> Result<Session, AccountError> {
        let response = self.api.accept_invite(invite_token).await?;
        let session = Session::from_login(AuthToken::new(response.token), response.user);
        self.store.write(&session)?;
        self.bus.publish(Topic::UserLoggedIn)?;
        tracing::info!(role = ?session.role, "invite accepted");
        Ok(session)
    }

    /// Set the password for a freshly accepted invite, then re-authenticate
    /// with the new credentials so the session carries a regular token.
    pub async fn set_password(&self, new_password: &str) -> Result<Session, AccountError> {
        let trimmed = new_password.trim();
        if trimmed.chars().count() < 6 {
            return Err(
                DomainError::validation("password must be at least 6 characters").into(),
            );
        }

        let session = self.store.read();
        let token = session.token.ok_or(AccountError::NotLoggedIn)?;
        let email = session
            .user
            .as_ref()
            .map(|u| u.email.clone())
            .ok_or(AccountError::NotLoggedIn)?;

        self.api.set_password(&token, trimmed).await?;
        self.login(&email, trimmed).await
    }

    /// Destroy the session.
    ///
    /// Clears the store (token last) and then broadcasts so every mounted
    /// surface re-resolves to the logged-out capability set.
    pub fn logout(&self) -> Result<(), AccountError> {
        self.store.clear()?;
        self.bus.publish(Topic::PermissionsChanged)?;
        tracing::info!("session cleared");
        Ok(())
    }

    /// Re-derive and persist the current user's permission flags from an
    /// updated record, then broadcast the change.
    pub fn apply_permission_flags(&self, record: &UserRecord) -> Result<(), AccountError> {
        let token = self.store.read().token.ok_or(AccountError::NotLoggedIn)?;
        let updated = Session::from_login(token, record.clone());
        self.store.write(&updated)?;
        self.bus.publish(Topic::PermissionsChanged)?;
        Ok(())
    }

    pub fn session(&self) -> Session {
        self.store.read()
    }

    pub fn capabilities(&self) -> Capabilities {
        resolve(&self.store.read())
    }

    pub fn decide_route(&self, path: &str) -> RouteDecision {
        decide(path, &self.store.read())
    }

    /// Replay queued cross-context notices onto the in-process bus.
    ///
    /// Call on the owning context's turn. Each pending notice becomes one
    /// `StorageChanged` publish, so subscribers re-read the store exactly as
    /// they would for a local change. Returns how many notices were pending.
    pub fn pump_external(&self, watcher: &ContextWatcher) -> Result<usize, AccountError> {
        let mut count = 0;
        while watcher.try_recv().is_ok() {
            self.bus.publish(Topic::StorageChanged)?;
            count += 1;
        }
        Ok(count)
    }

    /// Bind a mounted surface to the session; see [`ViewBinding`].
    pub fn bind_view(&self, name: impl Into<String>) -> ViewBinding {
        ViewBinding::new(name.into(), self.store.clone(), &self.bus)
    }

    pub(crate) fn token(&self) -> Result<AuthToken, AccountError> {
        self.store.read().token.ok_or(AccountError::NotLoggedIn)
    }
}
