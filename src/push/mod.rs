//! Push channel registration for parent sessions.
//!
//! DESIGN
//! ======
//! Registration is a secondary step of login: it runs after the session is
//! established and its result is a `PushOutcome` value, never an error of
//! the login. Every failure inside `try_register` is folded into
//! `PushOutcome::Failed` and logged at `warn`.
//!
//! The token that provisioning returns is the exact string written to the
//! store and sent to the server. Nothing in between rewrites it.

pub mod permission;
pub mod provision;

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::AuthApi;
use crate::store::{DEVICE_ID_KEY, KeyValueStore, PUSH_TOKEN_KEY};
use crate::types::{PushError, PushRegistration, Session};

pub use permission::StaticPermissions;
pub use provision::{HttpPushProvisioner, UnconfiguredProvisioner};

// =============================================================================
// PLATFORM SEAMS
// =============================================================================

/// Notification permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Platform notification-permission capability.
#[async_trait::async_trait]
pub trait PermissionService: Send + Sync {
    /// Current status, without prompting.
    ///
    /// # Errors
    ///
    /// Returns a [`PushError::Permission`] if the platform query fails.
    async fn status(&self) -> Result<PermissionStatus, PushError>;

    /// Ask the user for permission and report the resulting status.
    ///
    /// # Errors
    ///
    /// Returns a [`PushError::Permission`] if the platform prompt fails.
    async fn request(&self) -> Result<PermissionStatus, PushError>;
}

/// Platform push service that issues channel tokens.
#[async_trait::async_trait]
pub trait PushProvisioner: Send + Sync {
    /// Obtain the channel token for this device under `project_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`PushError::Provision`] if no token can be issued.
    async fn push_token(&self, project_id: &str, device_id: &str) -> Result<String, PushError>;
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Result of the push step, reported alongside a successful login.
#[derive(Debug)]
pub enum PushOutcome {
    /// The role has no push step.
    Skipped,
    /// The user did not grant notification permission.
    PermissionDenied,
    Registered(PushRegistration),
    Failed(PushError),
}

impl PushOutcome {
    #[must_use]
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered(_))
    }

    /// Short label for logs and CLI output.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::PermissionDenied => "permission_denied",
            Self::Registered(_) => "registered",
            Self::Failed(_) => "failed",
        }
    }
}

// =============================================================================
// REGISTRAR
// =============================================================================

/// Everything the push step needs besides the server API.
#[derive(Clone)]
pub struct PushRegistrar {
    permissions: Arc<dyn PermissionService>,
    provisioner: Arc<dyn PushProvisioner>,
    store: Arc<dyn KeyValueStore>,
    project_id: Option<String>,
}

impl PushRegistrar {
    #[must_use]
    pub fn new(
        permissions: Arc<dyn PermissionService>,
        provisioner: Arc<dyn PushProvisioner>,
        store: Arc<dyn KeyValueStore>,
        project_id: Option<String>,
    ) -> Self {
        Self { permissions, provisioner, store, project_id }
    }

    /// Run the push step for `session`. Never fails; see [`PushOutcome`].
    pub async fn register(&self, api: &dyn AuthApi, session: &Session) -> PushOutcome {
        match self.try_register(api, session).await {
            Ok(Some(registration)) => {
                info!(token_len = registration.token.len(), "push channel registered");
                PushOutcome::Registered(registration)
            }
            Ok(None) => {
                info!("notification permission not granted; push registration skipped");
                PushOutcome::PermissionDenied
            }
            Err(e) => {
                warn!(error = %e, "push registration failed; login continues");
                PushOutcome::Failed(e)
            }
        }
    }

    async fn try_register(&self, api: &dyn AuthApi, session: &Session) -> Result<Option<PushRegistration>, PushError> {
        let mut status = self.permissions.status().await?;
        if status != PermissionStatus::Granted {
            status = self.permissions.request().await?;
        }
        if status != PermissionStatus::Granted {
            return Ok(None);
        }

        let project_id = self.project_id.as_deref().ok_or(PushError::MissingProjectId)?;
        let device_id = self.device_id().await?;
        let token = self.provisioner.push_token(project_id, &device_id).await?;
        if token.is_empty() {
            return Err(PushError::Provision("empty push token".into()));
        }

        self.store.set(PUSH_TOKEN_KEY, &token).await?;
        api.upsert_push_token(session, &token).await?;

        Ok(Some(PushRegistration { token }))
    }

    /// Stable per-install id, created on first use.
    async fn device_id(&self) -> Result<String, PushError> {
        if let Some(existing) = self.store.get(DEVICE_ID_KEY).await? {
            return Ok(existing);
        }
        let fresh = uuid::Uuid::new_v4().to_string();
        self.store.set(DEVICE_ID_KEY, &fresh).await?;
        Ok(fresh)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
