//! The administration surface over the user list.

use std::sync::Mutex;

use carecircle_auth::UserRecord;
use carecircle_core::{DomainError, UserId};

use crate::api::UserUpdate;
use crate::manager::{AccountError, SessionManager};

#[derive(Debug, Copy, Clone)]
enum Toggle {
    Contributor,
    ViewOnly,
}

/// Cached user list with optimistic permission toggles.
///
/// A toggle flips the local row immediately, then calls the service. When
/// the toggled row is the current user, their own capability flags follow
/// the same tentative-then-reconcile path. On failure the toggled flag (and
/// only that flag) flips back to its previous value, the capability set is
/// restored, and the error is returned for the caller to surface.
#[derive(Debug)]
pub struct UserDirectory {
    manager: SessionManager,
    users: Mutex<Vec<UserRecord>>,
}

impl UserDirectory {
    pub fn new(manager: SessionManager) -> Self {
        Self {
            manager,
            users: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the cached list.
    pub fn users(&self) -> Vec<UserRecord> {
        self.users
            .lock()
            .map(|users| users.clone())
            .unwrap_or_default()
    }

    /// Fetch the list from the service.
    ///
    /// If the current user appears in the fetched list, their own permission
    /// flags are re-derived and broadcast, so a restriction an admin applied
    /// elsewhere takes effect here on the next refresh.
    pub async fn refresh(&self) -> Result<Vec<UserRecord>, AccountError> {
        let token = self.manager.token()?;
        let fetched = self.manager.api.list_users(&token).await?;

        let own_id = self.manager.session().user.map(|u| u.id);
        if let Some(id) = own_id {
            if let Some(own) = fetched.iter().find(|u| u.id == id) {
                self.manager.apply_permission_flags(own)?;
            }
        }

        *self.users.lock().map_err(|_| AccountError::Poisoned)? = fetched.clone();
        Ok(fetched)
    }

    /// Toggle a user's contributor flag, optimistically.
    pub async fn set_contributor(&self, id: UserId, value: bool) -> Result<(), AccountError> {
        self.toggle(id, Toggle::Contributor, value).await
    }

    /// Toggle a user's view-only override, optimistically.
    pub async fn set_view_only(&self, id: UserId, value: bool) -> Result<(), AccountError> {
        self.toggle(id, Toggle::ViewOnly, value).await
    }

    /// Apply a profile edit and refetch the list.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &UserUpdate,
    ) -> Result<(), AccountError> {
        let token = self.manager.token()?;
        self.manager.api.update_user(&token, id, update).await?;
        self.refresh().await?;
        Ok(())
    }

    /// Delete a user and refetch the list.
    pub async fn remove(&self, id: UserId) -> Result<(), AccountError> {
        let token = self.manager.token()?;
        self.manager.api.delete_user(&token, id).await?;
        self.refresh().await?;
        Ok(())
    }

    async fn toggle(&self, id: UserId, which: Toggle, value: bool) -> Result<(), AccountError> {
        let token = self.manager.token()?;
        let previous = self.apply_local(id, which, value)?;
        // Toggling yourself changes your own capability set, tentatively.
        let own = self.manager.session().user.map(|u| u.id) == Some(id);
        if own {
            self.sync_own_flags(id)?;
        }

        let update = match which {
            Toggle::Contributor => UserUpdate::contributor(value),
            Toggle::ViewOnly => UserUpdate::view_only(value),
        };

        match self.manager.api.update_user(&token, id, &update).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::error!(user = %id, error = %err, "permission update failed, reverting");
                self.apply_local(id, which, previous)?;
                if own {
                    self.sync_own_flags(id)?;
                }
                Err(err.into())
            }
        }
    }

    fn sync_own_flags(&self, id: UserId) -> Result<(), AccountError> {
        if let Some(own) = self.find(id)? {
            self.manager.apply_permission_flags(&own)?;
        }
        Ok(())
    }

    /// Flip exactly one flag on the cached row, returning its previous value.
    fn apply_local(&self, id: UserId, which: Toggle, value: bool) -> Result<bool, AccountError> {
        let mut users = self.users.lock().map_err(|_| AccountError::Poisoned)?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AccountError::Domain(DomainError::not_found()))?;
        let slot = match which {
            Toggle::Contributor => &mut user.is_contributor,
            Toggle::ViewOnly => &mut user.is_view_only,
        };
        let previous = *slot;
        *slot = value;
        Ok(previous)
    }

    fn find(&self, id: UserId) -> Result<Option<UserRecord>, AccountError> {
        let users = self.users.lock().map_err(|_| AccountError::Poisoned)?;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}
