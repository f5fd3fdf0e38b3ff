//! The account service boundary.
//!
//! The service itself is an external collaborator; this module owns the
//! client contract, the wire shapes, and an in-memory stand-in.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use carecircle_auth::{AuthToken, Role, UserRecord};
use carecircle_core::UserId;

/// Successful authentication or invite acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserRecord,
}

/// Partial update to a user record. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_contributor: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_view_only: Option<bool>,
}

impl UserUpdate {
    pub fn contributor(value: bool) -> Self {
        Self {
            is_contributor: Some(value),
            ..Self::default()
        }
    }

    pub fn view_only(value: bool) -> Self {
        Self {
            is_view_only: Some(value),
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Wrong email/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Unknown, expired, or already-used invite token.
    #[error("invalid or expired invite token")]
    InvalidInvite,

    /// The service answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never completed.
    #[error("network failure: {0}")]
    Network(String),
}

/// Client contract for the care service's account endpoints.
#[async_trait]
pub trait ApiClient: Send + Sync + std::fmt::Debug {
    async fn authenticate(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    async fn accept_invite(&self, invite_token: &str) -> Result<LoginResponse, ApiError>;

    async fn set_password(&self, token: &AuthToken, new_password: &str) -> Result<(), ApiError>;

    async fn list_users(&self, token: &AuthToken) -> Result<Vec<UserRecord>, ApiError>;

    async fn update_user(
        &self,
        token: &AuthToken,
        id: UserId,
        update: &UserUpdate,
    ) -> Result<(), ApiError>;

    async fn delete_user(&self, token: &AuthToken, id: UserId) -> Result<(), ApiError>;
}

#[derive(Debug, Default)]
struct ApiState {
    users: Vec<UserRecord>,
    passwords: HashMap<String, String>,
    invites: HashMap<String, UserId>,
    sessions: HashMap<String, UserId>,
}

/// In-memory account service for tests/dev.
///
/// Seed accounts and invites up front; `fail_next_update` makes the next
/// `update_user` call fail once, for exercising the failure paths.
#[derive(Debug, Default)]
pub struct InMemoryApi {
    state: Mutex<ApiState>,
    fail_next_update: AtomicBool,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account that can authenticate with `password`.
    pub fn seed_user(&self, record: UserRecord, password: &str) {
        if let Ok(mut state) = self.state.lock() {
            state
                .passwords
                .insert(record.email.clone(), password.to_string());
            state.users.push(record);
        }
    }

    /// Register an invited account reachable only through `invite_token`.
    pub fn seed_invite(&self, invite_token: &str, record: UserRecord) {
        if let Ok(mut state) = self.state.lock() {
            state.invites.insert(invite_token.to_string(), record.id);
            state.users.push(record);
        }
    }

    /// Make the next `update_user` call fail with a network error.
    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }

    fn mint_token() -> String {
        format!("tok-{}", Uuid::now_v7())
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, ApiState>, ApiError> {
        self.state
            .lock()
            .map_err(|_| ApiError::Network("api state lock poisoned".to_string()))
    }
}

fn unauthorized() -> ApiError {
    ApiError::Http {
        status: 401,
        message: "unknown or expired token".to_string(),
    }
}

#[async_trait]
impl ApiClient for InMemoryApi {
    async fn authenticate(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let mut state = self.locked()?;
        let known = state.passwords.get(email).map(String::as_str) == Some(password);
        if !known {
            return Err(ApiError::InvalidCredentials);
        }
        let user = state
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(ApiError::InvalidCredentials)?;

        let token = Self::mint_token();
        state.sessions.insert(token.clone(), user.id);
        Ok(LoginResponse { token, user })
    }

    async fn accept_invite(&self, invite_token: &str) -> Result<LoginResponse, ApiError> {
        let mut state = self.locked()?;
        // Invites are single-use.
        let user_id = state
            .invites
            .remove(invite_token)
            .ok_or(ApiError::InvalidInvite)?;
        let user = state
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(ApiError::InvalidInvite)?;

        let token = Self::mint_token();
        state.sessions.insert(token.clone(), user.id);
        Ok(LoginResponse { token, user })
    }

    async fn set_password(&self, token: &AuthToken, new_password: &str) -> Result<(), ApiError> {
        let mut state = self.locked()?;
        let user_id = *state.sessions.get(token.as_str()).ok_or_else(unauthorized)?;
        let email = state
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.email.clone())
            .ok_or_else(unauthorized)?;
        state.passwords.insert(email, new_password.to_string());
        Ok(())
    }

    async fn list_users(&self, token: &AuthToken) -> Result<Vec<UserRecord>, ApiError> {
        let state = self.locked()?;
        if !state.sessions.contains_key(token.as_str()) {
            return Err(unauthorized());
        }
        Ok(state.users.clone())
    }

    async fn update_user(
        &self,
        token: &AuthToken,
        id: UserId,
        update: &UserUpdate,
    ) -> Result<(), ApiError> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(ApiError::Network("simulated connection reset".to_string()));
        }

        let mut state = self.locked()?;
        if !state.sessions.contains_key(token.as_str()) {
            return Err(unauthorized());
        }
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(ApiError::Http {
                status: 404,
                message: "user not found".to_string(),
            })?;

        if let Some(fullname) = &update.fullname {
            user.fullname = fullname.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        if let Some(role) = &update.role {
            user.role = role.clone();
        }
        if let Some(is_contributor) = update.is_contributor {
            user.is_contributor = is_contributor;
        }
        if let Some(is_view_only) = update.is_view_only {
            user.is_view_only = is_view_only;
        }
        Ok(())
    }

    async fn delete_user(&self, token: &AuthToken, id: UserId) -> Result<(), ApiError> {
        let mut state = self.locked()?;
        if !state.sessions.contains_key(token.as_str()) {
            return Err(unauthorized());
        }
        state.users.retain(|u| u.id != id);
        Ok(())
    }
}
