//! Pull request operations.

use crate::auth::InstallationTokenSource;
use crate::client::GitHubClient;
use crate::errors::{GitHubError, GitHubResult};
use crate::pagination::{list_url, PageSize, TimeBoundary, Traversal};
use crate::types::{PullRequest, PullRequestDetail, PullRequestRecord, Repo, Review};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Service for pull request operations.
pub struct PullRequestsService<'a> {
    client: &'a GitHubClient,
}

impl<'a> PullRequestsService<'a> {
    /// Creates a new pull requests service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists pull requests of a repository in every state, newest first,
    /// stopping after the first full page that reaches back to `base`.
    pub async fn list_all(
        &self,
        owner: &str,
        repo: &str,
        base: DateTime<Utc>,
        source: &dyn InstallationTokenSource,
    ) -> GitHubResult<Vec<PullRequest>> {
        let url = list_url(
            self.client,
            &format!("/repos/{}/{}/pulls", owner, repo),
            &[("state", "all")],
            PageSize::PULL_REQUESTS,
        )?;

        Traversal::new(
            self.client,
            source,
            url,
            PageSize::PULL_REQUESTS,
            format!("{}/{} pull requests", owner, repo),
        )
        .with_boundary(TimeBoundary::new(base, |pr: &PullRequest| pr.created_at))
        .collect()
        .await
    }

    /// Gets a single pull request with its diff counters.
    pub async fn get(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        source: &dyn InstallationTokenSource,
    ) -> GitHubResult<PullRequestDetail> {
        let url = self
            .client
            .endpoint(&format!("/repos/{}/{}/pulls/{}", owner, repo, number));
        let body = self.client.get(&url, source).await?;

        serde_json::from_slice(&body).map_err(|e| {
            GitHubError::decode(format!("{}/{} pull request #{}", owner, repo, number), e)
        })
    }

    /// Lists every review of a pull request.
    pub async fn list_all_reviews(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        source: &dyn InstallationTokenSource,
    ) -> GitHubResult<Vec<Review>> {
        let url = list_url(
            self.client,
            &format!("/repos/{}/{}/pulls/{}/reviews", owner, repo, number),
            &[],
            PageSize::REVIEWS,
        )?;

        Traversal::new(
            self.client,
            source,
            url,
            PageSize::REVIEWS,
            format!("{}/{}#{} reviews", owner, repo, number),
        )
        .collect()
        .await
    }

    /// Collects every pull request of `repos` newer than `base`, each with
    /// its detail and reviews.
    ///
    /// Requests run one after another; the first failure aborts the whole
    /// collection.
    pub async fn collect(
        &self,
        repos: &[Repo],
        base: DateTime<Utc>,
        source: &dyn InstallationTokenSource,
    ) -> GitHubResult<Vec<PullRequestRecord>> {
        let owner = source.account_name().to_string();
        let mut records = Vec::new();

        for repo in repos {
            let pulls = self.list_all(&owner, &repo.name, base, source).await?;
            info!(repo = %repo.name, pull_requests = pulls.len(), "Collecting pull requests");

            for pr in pulls {
                let detail = self.get(&owner, &repo.name, pr.number, source).await?;
                let reviews = self
                    .list_all_reviews(&owner, &repo.name, pr.number, source)
                    .await?;
                debug!(
                    repo = %repo.name,
                    number = pr.number,
                    reviews = reviews.len(),
                    "Pull request collected"
                );

                records.push(PullRequestRecord::assemble(repo, pr, detail, reviews));
            }
        }

        Ok(records)
    }
}
