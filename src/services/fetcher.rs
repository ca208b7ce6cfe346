//! The fetch layer as seen by the engine.

use crate::auth::InstallationTokenSource;
use crate::client::GitHubClient;
use crate::errors::GitHubResult;
use crate::types::{Member, PullRequestRecord, Repo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Fetches everything a report is built from, scoped to one organization.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsFetcher: Send + Sync {
    /// Organization members.
    async fn members(&self) -> GitHubResult<Vec<Member>>;

    /// Organization repositories.
    async fn repos(&self) -> GitHubResult<Vec<Repo>>;

    /// Pull requests of `repos` newer than `base`, with detail and reviews.
    async fn pull_requests(
        &self,
        repos: &[Repo],
        base: DateTime<Utc>,
    ) -> GitHubResult<Vec<PullRequestRecord>>;
}

/// [`StatsFetcher`] backed by the GitHub API.
pub struct GitHubStatsFetcher {
    client: GitHubClient,
    tokens: Arc<dyn InstallationTokenSource>,
}

impl GitHubStatsFetcher {
    /// Creates a fetcher for the organization `tokens` is scoped to.
    pub fn new(client: GitHubClient, tokens: Arc<dyn InstallationTokenSource>) -> Self {
        Self { client, tokens }
    }
}

#[async_trait]
impl StatsFetcher for GitHubStatsFetcher {
    async fn members(&self) -> GitHubResult<Vec<Member>> {
        self.client
            .organizations()
            .list_all_members(self.tokens.account_name(), self.tokens.as_ref())
            .await
    }

    async fn repos(&self) -> GitHubResult<Vec<Repo>> {
        self.client
            .organizations()
            .list_all_repos(self.tokens.account_name(), self.tokens.as_ref())
            .await
    }

    async fn pull_requests(
        &self,
        repos: &[Repo],
        base: DateTime<Utc>,
    ) -> GitHubResult<Vec<PullRequestRecord>> {
        self.client
            .pull_requests()
            .collect(repos, base, self.tokens.as_ref())
            .await
    }
}
