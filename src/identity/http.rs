//! Identity provider that verifies tokens against a remote HTTP endpoint.
//!
//! The endpoint receives the caller's token as `Authorization: Bearer ...`
//! (plus an optional service key in `x-api-key`) and answers with
//! `{"userId": "...", "email": "...", "name": "..."}`.

use crate::core::error::IdentityError;
use crate::identity::{ExternalIdentity, IdentityProvider};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

/// Configuration for [`HttpIdentityProvider`].
#[derive(Debug, Clone)]
pub struct HttpIdentityConfig {
    /// Verification endpoint.
    pub verify_url: String,

    /// Service key sent alongside the token (kept secret).
    pub api_key: Option<SecretString>,

    /// Request timeout.
    pub timeout: Duration,
}

impl HttpIdentityConfig {
    /// Creates a configuration for the given endpoint.
    pub fn new(verify_url: impl Into<String>) -> Self {
        Self {
            verify_url: verify_url.into(),
            api_key: None,
            timeout: Duration::from_secs(5),
        }
    }

    /// Sets the service key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(key.into().into()));
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    user_id: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
}

/// Verifies tokens by calling a remote identity service.
#[derive(Debug)]
pub struct HttpIdentityProvider {
    config: HttpIdentityConfig,
    client: reqwest::Client,
}

impl HttpIdentityProvider {
    /// Creates a provider with its own HTTP client.
    pub fn new(config: HttpIdentityConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                IdentityError::unavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify(&self, token: &str) -> Result<ExternalIdentity, IdentityError> {
        let mut request = self.client.get(&self.config.verify_url).bearer_auth(token);
        if let Some(key) = &self.config.api_key {
            request = request.header("x-api-key", key.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Identity provider request failed");
            IdentityError::unavailable(e.to_string())
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(IdentityError::invalid(format!("provider answered {}", status)));
        }
        if !status.is_success() {
            tracing::warn!(%status, "Identity provider returned an error");
            return Err(IdentityError::unavailable(format!(
                "provider answered {}",
                status
            )));
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::unavailable(format!("unreadable response: {}", e)))?;

        Ok(ExternalIdentity {
            external_id: body.user_id,
            email: body.email,
            name: body.name,
        })
    }
}
