//! Local persistence seams: the durable key-value slot and the session hand-off.
//!
//! ARCHITECTURE
//! ============
//! Both stores are traits so the bootstrapper can be driven by in-memory
//! fakes in tests and by a JSON file from the CLI. The session store is the
//! external owner of session lifecycle; this crate only ever calls `login`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::types::{Session, StoreError};

/// Key under which the push channel token is persisted.
pub const PUSH_TOKEN_KEY: &str = "expoPushToken";
/// Key under which the per-install device id is persisted.
pub const DEVICE_ID_KEY: &str = "deviceId";

// =============================================================================
// KEY-VALUE STORE
// =============================================================================

/// Durable string slots that survive process restarts.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a slot.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backing storage cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a slot, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backing storage cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Clear a slot. Clearing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backing storage cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.slots().remove(key);
        Ok(())
    }
}

/// JSON-object file on disk. Writes go through a temp file and a rename.
pub struct FileStore {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: tokio::sync::Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, slots: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(slots)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut slots = self.load().await?;
        slots.insert(key.to_owned(), value.to_owned());
        self.save(&slots).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut slots = self.load().await?;
        if slots.remove(key).is_some() {
            self.save(&slots).await?;
        }
        Ok(())
    }
}

// =============================================================================
// SESSION STORE
// =============================================================================

/// External owner of the authenticated session.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Take ownership of a freshly established session.
    ///
    /// # Errors
    ///
    /// Returns a message if the store cannot accept the session.
    async fn login(&self, user: serde_json::Value, token: String) -> Result<(), String>;
}

/// Holds the current session for the process lifetime.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    current: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The session handed over by the most recent login, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Drop the session (external logout).
    pub fn logout(&self) {
        *self.current.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn login(&self, user: serde_json::Value, token: String) -> Result<(), String> {
        *self.current.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(Session { user, token });
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
