//! HTTP client for the live care service.

use async_trait::async_trait;
use serde::Serialize;

use carecircle_auth::{AuthToken, UserRecord};
use carecircle_core::UserId;

use crate::api::{ApiClient, ApiError, LoginResponse, UserUpdate};

/// Account endpoints over HTTP.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewPassword<'a> {
    new_password: &'a str,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

async fn http_error(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    ApiError::Http { status, message }
}

#[async_trait]
impl ApiClient for HttpApi {
    /// Admin accounts and contact accounts authenticate against different
    /// endpoints. The admin endpoint is tried first; a 400 means "not an
    /// admin account", so the contact endpoint gets the same credentials.
    async fn authenticate(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let credentials = Credentials { email, password };

        let response = self
            .client
            .post(self.url("/api/mainusers/login"))
            .json(&credentials)
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(response.json().await?);
        }
        if response.status().as_u16() != 400 {
            return Err(http_error(response).await);
        }

        let fallback = self
            .client
            .post(self.url("/api/contactusers/login"))
            .json(&credentials)
            .send()
            .await?;
        if fallback.status().is_success() {
            return Ok(fallback.json().await?);
        }
        match fallback.status().as_u16() {
            400 | 401 => Err(ApiError::InvalidCredentials),
            _ => Err(http_error(fallback).await),
        }
    }

    async fn accept_invite(&self, invite_token: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .client
            .get(self.url("/api/contactusers/accept-invite"))
            .query(&[("token", invite_token)])
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(response.json().await?);
        }
        match response.status().as_u16() {
            400 | 404 | 410 => Err(ApiError::InvalidInvite),
            _ => Err(http_error(response).await),
        }
    }

    async fn set_password(&self, token: &AuthToken, new_password: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/api/contactusers/set-password"))
            .bearer_auth(token.as_str())
            .json(&NewPassword { new_password })
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(http_error(response).await)
        }
    }

    async fn list_users(&self, token: &AuthToken) -> Result<Vec<UserRecord>, ApiError> {
        let response = self
            .client
            .get(self.url("/api/contactusers"))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(http_error(response).await)
        }
    }

    async fn update_user(
        &self,
        token: &AuthToken,
        id: UserId,
        update: &UserUpdate,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.url(&format!("/api/contactusers/{id}")))
            .bearer_auth(token.as_str())
            .json(update)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(http_error(response).await)
        }
    }

    async fn delete_user(&self, token: &AuthToken, id: UserId) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/contactusers/{id}")))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(http_error(response).await)
        }
    }
}
