//! HTTP push-token provisioning.

use std::time::Duration;

use super::PushProvisioner;
use crate::config::HttpTimeouts;
use crate::types::PushError;

pub struct HttpPushProvisioner {
    http: reqwest::Client,
    url: String,
}

impl HttpPushProvisioner {
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()?;
        Ok(Self { http, url: url.into() })
    }
}

#[async_trait::async_trait]
impl PushProvisioner for HttpPushProvisioner {
    async fn push_token(&self, project_id: &str, device_id: &str) -> Result<String, PushError> {
        let body = ProvisionRequest { project_id, device_id };
        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PushError::Provision(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| PushError::Provision(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(PushError::Provision(format!("status {status}")));
        }
        parse_provision_response(&text)
    }
}

/// Stand-in used when no provisioning endpoint is configured. Never sends anything.
pub struct UnconfiguredProvisioner;

#[async_trait::async_trait]
impl PushProvisioner for UnconfiguredProvisioner {
    async fn push_token(&self, _project_id: &str, _device_id: &str) -> Result<String, PushError> {
        Err(PushError::Provision("no provisioning endpoint configured (CLASSROOM_PUSH_PROVISION_URL)".into()))
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ProvisionRequest<'a> {
    project_id: &'a str,
    device_id: &'a str,
}

#[derive(serde::Deserialize)]
struct ProvisionResponse {
    data: TokenData,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum TokenData {
    Plain(String),
    #[serde(rename_all = "camelCase")]
    Wrapped { expo_push_token: String },
}

pub(crate) fn parse_provision_response(json: &str) -> Result<String, PushError> {
    let parsed: ProvisionResponse = serde_json::from_str(json).map_err(|e| PushError::Provision(e.to_string()))?;
    let token = match parsed.data {
        TokenData::Plain(token) | TokenData::Wrapped { expo_push_token: token } => token,
    };
    if token.is_empty() {
        return Err(PushError::Provision("empty push token".into()));
    }
    Ok(token)
}

#[cfg(test)]
#[path = "provision_test.rs"]
mod tests;
