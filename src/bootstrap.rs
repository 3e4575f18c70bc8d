//! Auth bootstrap: credential check, role login, session hand-off and the push step.
//!
//! ARCHITECTURE
//! ============
//! Role-specific behavior comes from a static route table (`route`), not from
//! branching on role names. The caller passes the role in an explicit
//! `AuthContext`; nothing here reads ambient globals.
//!
//! FLOW
//! ====
//! `Idle -> Validating -> Submitting -> {Succeeded, Failed}`. Parents pass
//! through `RegisteringPush` between `Submitting` and `Succeeded`; the push
//! result never moves the flow to `Failed`.
//!
//! CANCELLATION
//! ============
//! Each login attempt takes a generation number. `cancel()` or a newer
//! attempt bumps the counter, and a response that comes back for an older
//! generation is dropped before it reaches the session store. Dropping the
//! `submit` future mid-flow (UI teardown) also returns the state to `Idle`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::api::{AuthApi, HttpAuthApi};
use crate::config::AuthConfig;
use crate::push::{
    HttpPushProvisioner, PermissionService, PushOutcome, PushProvisioner, PushRegistrar, UnconfiguredProvisioner,
};
use crate::store::{FileStore, SessionStore};
use crate::types::{Credentials, LoginError, Role, Session, SubmitError, ValidationError};

// =============================================================================
// ROLE ROUTES
// =============================================================================

/// What happens after a role's session is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostLoginAction {
    None,
    RegisterPush,
}

/// Per-role endpoint and hand-off destinations.
#[derive(Debug, PartialEq, Eq)]
pub struct RoleRoute {
    pub role: Role,
    pub login_path: &'static str,
    pub home_route: &'static str,
    pub register_route: &'static str,
    pub post_login: PostLoginAction,
}

static TEACHER_ROUTE: RoleRoute = RoleRoute {
    role: Role::Teacher,
    login_path: "/api/teacher/login",
    home_route: "teacher/(tabs)/home",
    register_route: "/registerTeacher",
    post_login: PostLoginAction::None,
};

static PARENT_ROUTE: RoleRoute = RoleRoute {
    role: Role::Parent,
    login_path: "/api/parent/login",
    home_route: "parent/(tabs)/home",
    register_route: "/registerParent",
    post_login: PostLoginAction::RegisterPush,
};

/// All dispatchable roles, in display order.
pub static ROLE_ROUTES: [&RoleRoute; 2] = [&TEACHER_ROUTE, &PARENT_ROUTE];

#[must_use]
pub fn route(role: Role) -> &'static RoleRoute {
    match role {
        Role::Teacher => &TEACHER_ROUTE,
        Role::Parent => &PARENT_ROUTE,
    }
}

/// Where "Register" sends a user of `role`.
#[must_use]
pub fn register_destination(role: Role) -> &'static str {
    route(role).register_route
}

// =============================================================================
// FLOW TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    Validating,
    Submitting,
    RegisteringPush,
    Succeeded,
    Failed,
}

/// Caller-supplied session context. `role` is the raw value from the role provider.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub role: String,
}

impl AuthContext {
    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

/// Result of a successful submit.
#[derive(Debug)]
pub struct LoginOutcome {
    pub role: Role,
    pub session: Session,
    /// Role home destination for the navigation layer.
    pub destination: &'static str,
    pub push: PushOutcome,
}

/// Held for the life of a `submit`. On drop it clears the in-flight flag and,
/// if the flow never reached `Succeeded` or `Failed` (future dropped on
/// teardown), puts the state back to `Idle`.
struct InFlightGuard<'a> {
    in_flight: &'a AtomicBool,
    state: &'a Mutex<FlowState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !matches!(*state, FlowState::Succeeded | FlowState::Failed) {
            *state = FlowState::Idle;
        }
        drop(state);
        self.in_flight.store(false, Ordering::Release);
    }
}

// =============================================================================
// BOOTSTRAPPER
// =============================================================================

pub struct AuthBootstrapper {
    api: Arc<dyn AuthApi>,
    sessions: Arc<dyn SessionStore>,
    push: PushRegistrar,
    state: Mutex<FlowState>,
    generation: AtomicU64,
    in_flight: AtomicBool,
}

impl AuthBootstrapper {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, sessions: Arc<dyn SessionStore>, push: PushRegistrar) -> Self {
        Self {
            api,
            sessions,
            push,
            state: Mutex::new(FlowState::Idle),
            generation: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Wire the HTTP API, file store and HTTP provisioner from config.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if an HTTP client cannot be built.
    pub fn from_config(
        config: &AuthConfig,
        sessions: Arc<dyn SessionStore>,
        permissions: Arc<dyn PermissionService>,
    ) -> Result<Self, reqwest::Error> {
        let api = Arc::new(HttpAuthApi::new(config.api_url.clone(), config.timeouts)?);
        let provisioner: Arc<dyn PushProvisioner> = match &config.push_provision_url {
            Some(url) => Arc::new(HttpPushProvisioner::new(url.clone(), config.timeouts)?),
            None => Arc::new(UnconfiguredProvisioner),
        };
        let store = Arc::new(FileStore::new(config.store_path.clone()));
        let push = PushRegistrar::new(permissions, provisioner, store, config.push_project_id.clone());
        Ok(Self::new(api, sessions, push))
    }

    #[must_use]
    pub fn state(&self) -> FlowState {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_state(&self, next: FlowState) {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = next;
    }

    /// # Errors
    ///
    /// See [`crate::validate::validate`].
    #[allow(clippy::unused_self)]
    pub fn validate(&self, credentials: &Credentials) -> Result<(), ValidationError> {
        crate::validate::validate(credentials)
    }

    /// Abandon whatever attempt is in flight. Its response will be discarded.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn begin_attempt(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn is_current(&self, attempt: u64) -> bool {
        self.generation.load(Ordering::Acquire) == attempt
    }

    /// Log in as `role` and hand the session to the session store.
    ///
    /// Credentials are expected to have passed [`Self::validate`].
    ///
    /// # Errors
    ///
    /// Returns a [`LoginError`]; the session store is untouched in that case.
    pub async fn login(&self, role: Role, credentials: &Credentials) -> Result<Session, LoginError> {
        let attempt = self.begin_attempt();
        self.login_attempt(route(role), credentials, attempt).await
    }

    async fn login_attempt(
        &self,
        route: &RoleRoute,
        credentials: &Credentials,
        attempt: u64,
    ) -> Result<Session, LoginError> {
        let session = self.api.login(route.login_path, credentials).await?;

        if !self.is_current(attempt) {
            info!(role = %route.role, "discarding login response for superseded attempt");
            return Err(LoginError::Superseded);
        }

        self.sessions
            .login(session.user.clone(), session.token.clone())
            .await
            .map_err(LoginError::SessionStore)?;
        Ok(session)
    }

    /// Run the push step for an established parent session.
    pub async fn register_push_channel(&self, session: &Session) -> PushOutcome {
        self.push.register(&*self.api, session).await
    }

    /// Full user-initiated flow: role, validation, login, post-login action.
    ///
    /// # Errors
    ///
    /// Returns a [`SubmitError`] whose `Display` is the text to show the user.
    pub async fn submit(&self, context: &AuthContext, credentials: &Credentials) -> Result<LoginOutcome, SubmitError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(SubmitError::InFlight);
        }
        let _guard = InFlightGuard { in_flight: &self.in_flight, state: &self.state };

        self.set_state(FlowState::Validating);
        let checked = self
            .validate(credentials)
            .map_err(SubmitError::from)
            .and_then(|()| Ok(context.role.parse::<Role>()?));
        let role = match checked {
            Ok(role) => role,
            Err(e) => {
                warn!(error = %e, "login rejected before submit");
                self.set_state(FlowState::Failed);
                return Err(e);
            }
        };
        let role_route = route(role);

        self.set_state(FlowState::Submitting);
        info!(%role, "login submitted");
        let attempt = self.begin_attempt();
        let session = match self.login_attempt(role_route, credentials, attempt).await {
            Ok(session) => session,
            Err(LoginError::Superseded) => {
                self.set_state(FlowState::Idle);
                return Err(LoginError::Superseded.into());
            }
            Err(e) => {
                warn!(%role, error = %e, "login failed");
                self.set_state(FlowState::Failed);
                return Err(e.into());
            }
        };
        info!(%role, "session established");

        let push = match role_route.post_login {
            PostLoginAction::None => PushOutcome::Skipped,
            PostLoginAction::RegisterPush => {
                self.set_state(FlowState::RegisteringPush);
                self.register_push_channel(&session).await
            }
        };

        self.set_state(FlowState::Succeeded);
        info!(%role, push = push.label(), destination = role_route.home_route, "login complete");
        Ok(LoginOutcome { role, session, destination: role_route.home_route, push })
    }
}

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod tests;
