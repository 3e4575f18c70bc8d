//! Hand-written fakes for the bootstrapper's seams.

use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::sync::Notify;

use crate::api::AuthApi;
use crate::push::{PermissionService, PermissionStatus, PushProvisioner, PushRegistrar};
use crate::store::{KeyValueStore, MemoryStore, SessionStore};
use crate::types::{Credentials, LoginError, PushError, Session, StoreError};

/// Session the default `MockApi` hands out.
#[must_use]
pub fn sample_session() -> Session {
    Session { user: json!({ "id": 1 }), token: "t1".into() }
}

// =========================================================================
// MockApi
// =========================================================================

#[derive(Clone)]
pub enum LoginReply {
    Ok(Session),
    Reject { status: u16, message: Option<String> },
    Transport,
}

pub struct MockApi {
    pub login_calls: Mutex<Vec<(String, Credentials)>>,
    pub push_calls: Mutex<Vec<(String, String)>>,
    reply: LoginReply,
    push_status: Option<u16>,
    gate: Option<Arc<Notify>>,
}

impl MockApi {
    #[must_use]
    pub fn new(reply: LoginReply) -> Self {
        Self {
            login_calls: Mutex::new(Vec::new()),
            push_calls: Mutex::new(Vec::new()),
            reply,
            push_status: None,
            gate: None,
        }
    }

    #[must_use]
    pub fn ok() -> Self {
        Self::new(LoginReply::Ok(sample_session()))
    }

    /// Make push uploads fail with `status`.
    #[must_use]
    pub fn with_push_status(mut self, status: u16) -> Self {
        self.push_status = Some(status);
        self
    }

    /// Hold every login response until `gate` is notified.
    #[must_use]
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn login_paths(&self) -> Vec<String> {
        self.login_calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn push_tokens(&self) -> Vec<String> {
        self.push_calls.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

#[async_trait::async_trait]
impl AuthApi for MockApi {
    async fn login(&self, path: &str, credentials: &Credentials) -> Result<Session, LoginError> {
        self.login_calls.lock().unwrap().push((path.to_owned(), credentials.clone()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.reply.clone() {
            LoginReply::Ok(session) => Ok(session),
            LoginReply::Reject { status, message } => Err(LoginError::Rejected { status, message }),
            LoginReply::Transport => Err(LoginError::Transport("connection refused".into())),
        }
    }

    async fn upsert_push_token(&self, session: &Session, push_token: &str) -> Result<(), PushError> {
        self.push_calls.lock().unwrap().push((session.token.clone(), push_token.to_owned()));
        match self.push_status {
            Some(status) => Err(PushError::Upload { status }),
            None => Ok(()),
        }
    }
}

// =========================================================================
// MockPermissions / MockProvisioner
// =========================================================================

pub struct MockPermissions {
    pub current: PermissionStatus,
    pub answer: PermissionStatus,
    pub fail: bool,
    pub requests: Mutex<u32>,
}

impl MockPermissions {
    #[must_use]
    pub fn new(current: PermissionStatus, answer: PermissionStatus) -> Self {
        Self { current, answer, fail: false, requests: Mutex::new(0) }
    }

    #[must_use]
    pub fn granted() -> Self {
        Self::new(PermissionStatus::Granted, PermissionStatus::Granted)
    }

    #[must_use]
    pub fn denied() -> Self {
        Self::new(PermissionStatus::Denied, PermissionStatus::Denied)
    }

    #[must_use]
    pub fn failing() -> Self {
        Self { fail: true, ..Self::granted() }
    }

    pub fn request_count(&self) -> u32 {
        *self.requests.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl PermissionService for MockPermissions {
    async fn status(&self) -> Result<PermissionStatus, PushError> {
        if self.fail {
            return Err(PushError::Permission("platform unavailable".into()));
        }
        Ok(self.current)
    }

    async fn request(&self) -> Result<PermissionStatus, PushError> {
        *self.requests.lock().unwrap() += 1;
        Ok(self.answer)
    }
}

pub struct MockProvisioner {
    pub token: Option<String>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl MockProvisioner {
    #[must_use]
    pub fn issuing(token: &str) -> Self {
        Self { token: Some(token.to_owned()), calls: Mutex::new(Vec::new()) }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self { token: None, calls: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl PushProvisioner for MockProvisioner {
    async fn push_token(&self, project_id: &str, device_id: &str) -> Result<String, PushError> {
        self.calls.lock().unwrap().push((project_id.to_owned(), device_id.to_owned()));
        self.token
            .clone()
            .ok_or_else(|| PushError::Provision("push service unreachable".into()))
    }
}

// =========================================================================
// Stores
// =========================================================================

/// Key-value store whose writes always fail.
pub struct ReadOnlyStore;

#[async_trait::async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only")))
    }

    async fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Memory store that refuses writes to one key and accepts the rest.
pub struct RejectingKeyStore {
    pub inner: MemoryStore,
    rejected: &'static str,
}

impl RejectingKeyStore {
    #[must_use]
    pub fn new(rejected: &'static str) -> Self {
        Self { inner: MemoryStore::new(), rejected }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RejectingKeyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == self.rejected {
            return Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full")));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }
}

/// Session store that records every hand-off.
#[derive(Default)]
pub struct RecordingSessions {
    pub logins: Mutex<Vec<Session>>,
}

impl RecordingSessions {
    pub fn count(&self) -> usize {
        self.logins.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl SessionStore for RecordingSessions {
    async fn login(&self, user: serde_json::Value, token: String) -> Result<(), String> {
        self.logins.lock().unwrap().push(Session { user, token });
        Ok(())
    }
}

// =========================================================================
// Harness
// =========================================================================

/// A bootstrapper's collaborators, kept so tests can inspect them afterwards.
pub struct Harness {
    pub api: Arc<MockApi>,
    pub sessions: Arc<RecordingSessions>,
    pub permissions: Arc<MockPermissions>,
    pub provisioner: Arc<MockProvisioner>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    #[must_use]
    pub fn new(api: MockApi, permissions: MockPermissions, provisioner: MockProvisioner) -> Self {
        Self {
            api: Arc::new(api),
            sessions: Arc::new(RecordingSessions::default()),
            permissions: Arc::new(permissions),
            provisioner: Arc::new(provisioner),
            store: Arc::new(MemoryStore::new()),
        }
    }

    #[must_use]
    pub fn registrar(&self, project_id: Option<&str>) -> PushRegistrar {
        PushRegistrar::new(
            self.permissions.clone(),
            self.provisioner.clone(),
            self.store.clone(),
            project_id.map(str::to_owned),
        )
    }

    #[must_use]
    pub fn bootstrapper(&self) -> crate::bootstrap::AuthBootstrapper {
        crate::bootstrap::AuthBootstrapper::new(self.api.clone(), self.sessions.clone(), self.registrar(Some("proj-1")))
    }
}
