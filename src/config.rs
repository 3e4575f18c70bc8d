//! Client configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_STORE_PATH: &str = ".classroom-auth.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// API origin without trailing slash, e.g. `https://api.school.example`.
    pub api_url: String,
    /// Push project/application id. Push registration is skipped as failed without it.
    pub push_project_id: Option<String>,
    /// Push provisioning endpoint. No default; push registration fails without it.
    pub push_provision_url: Option<String>,
    pub store_path: PathBuf,
    pub timeouts: HttpTimeouts,
}

impl AuthConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `CLASSROOM_API_URL`
    ///
    /// Optional:
    /// - `CLASSROOM_PUSH_PROJECT_ID`
    /// - `CLASSROOM_PUSH_PROVISION_URL`: unset means no provisioning request is made
    /// - `CLASSROOM_STORE_PATH`: default `.classroom-auth.json`
    /// - `CLASSROOM_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CLASSROOM_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is missing or not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is missing or not an http(s) URL.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("CLASSROOM_API_URL").ok_or(ConfigError::Missing { var: "CLASSROOM_API_URL" })?;
        let api_url = normalize_base_url("CLASSROOM_API_URL", &api_url)?;

        let push_project_id = lookup("CLASSROOM_PUSH_PROJECT_ID")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());
        let push_provision_url = lookup("CLASSROOM_PUSH_PROVISION_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|raw| normalize_base_url("CLASSROOM_PUSH_PROVISION_URL", &raw))
            .transpose()?;
        let store_path = lookup("CLASSROOM_STORE_PATH").map_or_else(|| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from);
        let timeouts = HttpTimeouts {
            request_secs: parse_u64(lookup("CLASSROOM_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("CLASSROOM_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_url, push_project_id, push_provision_url, store_path, timeouts })
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}

/// Trim whitespace and trailing slashes; require an http(s) scheme.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` for empty or non-http values.
pub fn normalize_base_url(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid { var, reason: "empty".into() });
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::Invalid { var, reason: format!("expected http(s) URL, got '{trimmed}'") });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
