//! Installation access tokens.

use super::{bearer_header, AssertionSource, InstallationTokenSource};
use crate::client::build_http;
use crate::config::{AppAuthConfig, GitHubConfig};
use crate::errors::{GitHubError, GitHubResult};
use crate::observability::TracingHooks;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Installation token response.
///
/// Every field is optional so that a response missing `token` surfaces as a
/// credential error rather than a decode error.
#[derive(Clone, Deserialize)]
pub struct InstallationTokenResponse {
    /// Access token.
    pub token: Option<String>,
    /// Expiration time.
    pub expires_at: Option<DateTime<Utc>>,
    /// Permissions granted.
    #[serde(default)]
    pub permissions: HashMap<String, String>,
    /// Repository selection.
    pub repository_selection: Option<String>,
}

impl fmt::Debug for InstallationTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallationTokenResponse")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .field("permissions", &self.permissions)
            .field("repository_selection", &self.repository_selection)
            .finish()
    }
}

/// Mints and holds the installation access token.
///
/// There is no timer here: the token is re-minted when a data request comes
/// back 401.
pub struct InstallationTokenAgent {
    http: Client,
    config: GitHubConfig,
    installation_id: u64,
    account_name: String,
    signer: Arc<dyn AssertionSource>,
    token: RwLock<SecretString>,
}

impl InstallationTokenAgent {
    /// Creates an agent with no token yet.
    pub fn new(
        config: GitHubConfig,
        app: &AppAuthConfig,
        signer: Arc<dyn AssertionSource>,
    ) -> GitHubResult<Self> {
        let http = build_http(&config)?;
        Ok(Self {
            http,
            config,
            installation_id: app.installation_id,
            account_name: app.account_name.clone(),
            signer,
            token: RwLock::new(SecretString::new(String::new())),
        })
    }

    /// Installation this agent mints tokens for.
    pub fn installation_id(&self) -> u64 {
        self.installation_id
    }

    fn token_url(&self) -> String {
        self.config.endpoint(&format!(
            "/app/installations/{}/access_tokens",
            self.installation_id
        ))
    }

    async fn request_token(&self) -> GitHubResult<InstallationTokenResponse> {
        let url = self.token_url();
        let assertion = self.signer.bearer().await;

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, bearer_header(assertion.expose_secret()))
            .header(ACCEPT, &self.config.accept)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await
            .map_err(|e| {
                GitHubError::credential(format!("Installation token request to {} failed", url))
                    .with_cause(e)
            })?;

        let status = response.status().as_u16();
        if status > 204 {
            return Err(GitHubError::credential(format!(
                "Installation token request to {} returned unexpected status",
                url
            ))
            .with_status(status));
        }

        let body = response.bytes().await.map_err(|e| {
            GitHubError::credential("Failed to read installation token response").with_cause(e)
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            GitHubError::credential("Failed to decode installation token response").with_cause(e)
        })
    }
}

#[async_trait]
impl InstallationTokenSource for InstallationTokenAgent {
    fn account_name(&self) -> &str {
        &self.account_name
    }

    async fn bearer(&self) -> SecretString {
        self.token.read().await.clone()
    }

    async fn generate_new(&self) -> GitHubResult<()> {
        let response = self.request_token().await?;

        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GitHubError::credential("Token not available in response"))?;

        *self.token.write().await = SecretString::new(token);
        TracingHooks::on_installation_token_refresh(self.installation_id, response.expires_at);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_tolerates_missing_fields() {
        let parsed: InstallationTokenResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.token.is_none());
        assert!(parsed.permissions.is_empty());
    }

    #[test]
    fn test_token_response_debug_redacts_token() {
        let parsed: InstallationTokenResponse = serde_json::from_str(
            r#"{"token":"ghs_secret","expires_at":"2024-03-01T10:00:00Z","permissions":{"pull_requests":"read"}}"#,
        )
        .unwrap();

        let debug = format!("{:?}", parsed);
        assert!(!debug.contains("ghs_secret"));
        assert!(debug.contains("REDACTED"));
        assert!(debug.contains("pull_requests"));
    }
}
