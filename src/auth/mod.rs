//! GitHub App authentication.
//!
//! Two credentials are involved. The App signs a short-lived JWT with its
//! private key ([`JwtAgent`]); that JWT is exchanged for an installation
//! access token ([`InstallationTokenAgent`]) which authenticates every data
//! request. Consumers only see the capability traits below, so the fetch
//! layer can run against fakes.

mod installation;
mod jwt;

pub use installation::{InstallationTokenAgent, InstallationTokenResponse};
pub use jwt::{JwtAgent, JwtClaims, ShutdownReceiver};

use crate::errors::GitHubResult;
use async_trait::async_trait;
use secrecy::SecretString;

/// Something that holds a signed App assertion.
#[async_trait]
pub trait AssertionSource: Send + Sync {
    /// Returns the current signed assertion.
    async fn bearer(&self) -> SecretString;
}

/// Something that holds an installation access token and can re-mint it.
#[async_trait]
pub trait InstallationTokenSource: Send + Sync {
    /// Organization the installation is scoped to.
    fn account_name(&self) -> &str;

    /// Returns the current installation token. Empty until the first
    /// successful [`generate_new`](Self::generate_new).
    async fn bearer(&self) -> SecretString;

    /// Exchanges the App assertion for a fresh installation token.
    async fn generate_new(&self) -> GitHubResult<()>;
}

/// Formats an `Authorization` header value.
pub(crate) fn bearer_header(token: &str) -> String {
    format!("Bearer {}", token)
}
