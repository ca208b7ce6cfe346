//! App-level JWT signing and background renewal.

use super::AssertionSource;
use crate::config::{AppAuthConfig, JWT_VALIDITY};
use crate::errors::{GitHubError, GitHubResult};
use crate::observability::TracingHooks;
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};

/// Receiving half of the channel that stops the renewal loop.
///
/// Sending a message or dropping every sender both count as shutdown.
pub type ShutdownReceiver = mpsc::Receiver<()>;

/// JWT claims for GitHub App authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Issuer (App ID).
    pub iss: String,
}

/// Holds the App's signed assertion and keeps it fresh.
pub struct JwtAgent {
    app_id: String,
    private_key_path: PathBuf,
    renewal_interval: Duration,
    token: RwLock<SecretString>,
    renewals: AtomicU64,
}

impl JwtAgent {
    /// Creates an agent with no assertion yet. Call [`renew`](Self::renew)
    /// before handing it to consumers, or use [`start`](Self::start).
    pub fn new(config: &AppAuthConfig) -> Self {
        Self {
            app_id: config.app_id.clone(),
            private_key_path: config.private_key_path.clone(),
            renewal_interval: config.renewal_interval,
            token: RwLock::new(SecretString::new(String::new())),
            renewals: AtomicU64::new(0),
        }
    }

    /// Signs the first assertion and spawns the renewal task.
    pub async fn start(config: &AppAuthConfig, shutdown: ShutdownReceiver) -> GitHubResult<Arc<Self>> {
        let agent = Arc::new(Self::new(config));
        agent.renew().await?;
        agent.spawn_renewal(shutdown);
        Ok(agent)
    }

    /// Returns the current signed assertion.
    pub async fn bearer(&self) -> SecretString {
        self.token.read().await.clone()
    }

    /// Number of successful renewals so far.
    pub fn renewals(&self) -> u64 {
        self.renewals.load(Ordering::SeqCst)
    }

    /// Signs a new assertion and swaps it in.
    pub async fn renew(&self) -> GitHubResult<()> {
        let signed = self.sign().await?;

        *self.token.write().await = SecretString::new(signed);
        let generation = self.renewals.fetch_add(1, Ordering::SeqCst) + 1;
        TracingHooks::on_assertion_renewed(&self.app_id, generation);

        Ok(())
    }

    /// Renews every `renewal_interval` until shutdown is signalled.
    ///
    /// Returns the first renewal error; the loop cannot continue without a
    /// valid assertion.
    pub async fn schedule_renewal(&self, mut shutdown: ShutdownReceiver) -> GitHubResult<()> {
        loop {
            tokio::select! {
                _ = sleep(self.renewal_interval) => {
                    self.renew().await?;
                }
                _ = shutdown.recv() => {
                    info!(app_id = %self.app_id, "App assertion renewal stopped");
                    return Ok(());
                }
            }
        }
    }

    /// Runs [`schedule_renewal`](Self::schedule_renewal) on its own task.
    ///
    /// A renewal failure terminates the process.
    pub fn spawn_renewal(self: &Arc<Self>, shutdown: ShutdownReceiver) -> JoinHandle<()> {
        let agent = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = agent.schedule_renewal(shutdown).await {
                error!(
                    app_id = %agent.app_id,
                    error = %e,
                    "App assertion renewal failed, no further API access is possible"
                );
                std::process::exit(1);
            }
        })
    }

    async fn sign(&self) -> GitHubResult<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            iat: now.timestamp(),
            exp: (now + chrono::Duration::seconds(JWT_VALIDITY.as_secs() as i64)).timestamp(),
            iss: self.app_id.clone(),
        };

        let pem = tokio::fs::read(&self.private_key_path).await.map_err(|e| {
            GitHubError::credential(format!(
                "Failed to read private key {}",
                self.private_key_path.display()
            ))
            .with_cause(e)
        })?;

        let key = EncodingKey::from_rsa_pem(&pem).map_err(|e| {
            GitHubError::credential(format!("Failed to parse private key: {}", e))
        })?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| GitHubError::credential(format!("Failed to generate JWT: {}", e)))
    }
}

#[async_trait]
impl AssertionSource for JwtAgent {
    async fn bearer(&self) -> SecretString {
        JwtAgent::bearer(self).await
    }
}
