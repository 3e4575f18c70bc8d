//! Fixed-answer permission service for hosts without a notification prompt.

use std::sync::Mutex;

use super::{PermissionService, PermissionStatus};
use crate::types::PushError;

/// Reports a configured status and answers prompts the way mobile platforms
/// do: an explicit denial sticks, anything else is granted on request.
#[derive(Debug)]
pub struct StaticPermissions {
    current: Mutex<PermissionStatus>,
}

impl StaticPermissions {
    #[must_use]
    pub fn new(current: PermissionStatus) -> Self {
        Self { current: Mutex::new(current) }
    }

    fn current(&self) -> std::sync::MutexGuard<'_, PermissionStatus> {
        self.current.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl PermissionService for StaticPermissions {
    async fn status(&self) -> Result<PermissionStatus, PushError> {
        Ok(*self.current())
    }

    async fn request(&self) -> Result<PermissionStatus, PushError> {
        let mut current = self.current();
        if *current == PermissionStatus::Undetermined {
            *current = PermissionStatus::Granted;
        }
        Ok(*current)
    }
}
