//! School API client for role login and push-token upsert.
//!
//! Thin HTTP wrapper over the two endpoints the login flow touches. Status
//! and body handling lives in pure functions for testability.

use std::time::Duration;

use crate::config::HttpTimeouts;
use crate::types::{Credentials, LoginError, PushError, Session};

/// Upsert endpoint for the parent's push channel token.
pub const PUSH_TOKEN_PATH: &str = "/api/parent/push-token";

// =============================================================================
// TRAIT
// =============================================================================

/// Server calls made by the bootstrapper. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST {path}` with the credentials as JSON body.
    ///
    /// # Errors
    ///
    /// Returns a [`LoginError`] on transport failure, a non-success status,
    /// or a success body that is not `{user, token}`.
    async fn login(&self, path: &str, credentials: &Credentials) -> Result<Session, LoginError>;

    /// `PUT` the push token for the session's user. Idempotent server-side.
    ///
    /// # Errors
    ///
    /// Returns a [`PushError`] on transport failure or a non-success status.
    async fn upsert_push_token(&self, session: &Session, push_token: &str) -> Result<(), PushError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Build a client for `base_url` (no trailing slash).
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()?;
        Ok(Self { http, base_url: base_url.into() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, path: &str, credentials: &Credentials) -> Result<Session, LoginError> {
        let response = self
            .http
            .post(self.url(path))
            .json(credentials)
            .send()
            .await
            .map_err(|e| LoginError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LoginError::Transport(e.to_string()))?;

        parse_login_response(status, &text)
    }

    async fn upsert_push_token(&self, session: &Session, push_token: &str) -> Result<(), PushError> {
        let body = PushTokenRequest { push_token };
        let response = self
            .http
            .put(self.url(PUSH_TOKEN_PATH))
            .bearer_auth(&session.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Upload { status: status.as_u16() });
        }
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PushTokenRequest<'a> {
    push_token: &'a str,
}

#[derive(serde::Deserialize)]
struct LoginResponse {
    user: serde_json::Value,
    token: String,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

/// Turn a login response into a session or a user-presentable error.
pub(crate) fn parse_login_response(status: u16, body: &str) -> Result<Session, LoginError> {
    if !(200..300).contains(&status) {
        return Err(LoginError::Rejected { status, message: error_message(body) });
    }
    let parsed: LoginResponse = serde_json::from_str(body).map_err(|e| LoginError::Parse(e.to_string()))?;
    if parsed.token.is_empty() {
        return Err(LoginError::Parse("empty session token".into()));
    }
    Ok(Session { user: parsed.user, token: parsed.token })
}

/// Pull `message` out of a structured error payload, if there is one.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
