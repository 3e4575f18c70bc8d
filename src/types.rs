//! Credentials, roles, sessions and the error taxonomy.
//!
//! DESIGN
//! ======
//! Errors are split by how far they may travel. `ValidationError` and
//! `LoginError` surface to the user as text; `PushError` never leaves the
//! push-registration step except as a logged `PushOutcome` value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fallback shown when the server gives no structured error message.
pub const GENERIC_LOGIN_FAILURE: &str = "Login failed";

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Email/password pair submitted by the user. Serialized as the login body.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// ROLE
// =============================================================================

/// Account role. Selects the login endpoint and the post-login action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Parent,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Parent => "parent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role string that names neither a teacher nor a parent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported role: {0:?}")]
pub struct UnsupportedRole(pub String);

impl FromStr for Role {
    type Err = UnsupportedRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "teacher" => Ok(Self::Teacher),
            "parent" => Ok(Self::Parent),
            other => Err(UnsupportedRole(other.to_owned())),
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Authenticated user/token pair returned by a successful login.
///
/// `user` is whatever record the server sends; this crate never inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: serde_json::Value,
    pub token: String,
}

/// Push channel token held locally and mirrored to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRegistration {
    pub token: String,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Local input errors. These never reach the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("All fields are required")]
    EmptyField,
    #[error("Please enter a valid email")]
    InvalidEmailFormat,
}

/// Errors from the login request. Recoverable by resubmitting.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// The server answered with a non-success status.
    #[error("login rejected: status {status}")]
    Rejected { status: u16, message: Option<String> },

    /// The request never produced a response.
    #[error("login request failed: {0}")]
    Transport(String),

    /// The success body was not `{user, token}`.
    #[error("login response parse failed: {0}")]
    Parse(String),

    /// The session store refused the new session.
    #[error("session store failed: {0}")]
    SessionStore(String),

    /// A newer attempt (or a cancel) replaced this one before it finished.
    #[error("login attempt superseded")]
    Superseded,
}

impl LoginError {
    /// Text to show the user: the server's own message when it sent one.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Rejected { message: Some(message), .. } if !message.trim().is_empty() => message,
            _ => GENERIC_LOGIN_FAILURE,
        }
    }
}

/// Failures inside push registration. Always recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("notification permission check failed: {0}")]
    Permission(String),

    #[error("push project id not configured")]
    MissingProjectId,

    #[error("push token provisioning failed: {0}")]
    Provision(String),

    #[error("push token storage failed: {0}")]
    Storage(#[from] StoreError),

    #[error("push token upload rejected: status {status}")]
    Upload { status: u16 },

    #[error("push token upload failed: {0}")]
    Transport(String),
}

/// Errors from the durable key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store contents invalid: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors from the full user-initiated submit flow.
///
/// `Display` is the text the UI layer shows under the form.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{}", .0.user_message())]
    Login(#[from] LoginError),

    #[error("{0}")]
    UnsupportedRole(#[from] UnsupportedRole),

    #[error("a login is already in progress")]
    InFlight,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
