//! Organization operations.

use crate::auth::InstallationTokenSource;
use crate::client::GitHubClient;
use crate::errors::GitHubResult;
use crate::pagination::{list_url, PageSize, Traversal};
use crate::types::{Member, Repo, Repository, User};

/// Service for organization operations.
pub struct OrganizationsService<'a> {
    client: &'a GitHubClient,
}

impl<'a> OrganizationsService<'a> {
    /// Creates a new organizations service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists every member of an organization.
    pub async fn list_all_members(
        &self,
        org: &str,
        source: &dyn InstallationTokenSource,
    ) -> GitHubResult<Vec<Member>> {
        let url = list_url(self.client, &format!("/orgs/{}/members", org), &[], PageSize::MEMBERS)?;
        let users: Vec<User> = Traversal::new(self.client, source, url, PageSize::MEMBERS, "members")
            .collect()
            .await?;

        Ok(users.into_iter().map(Member::from).collect())
    }

    /// Lists every repository of an organization.
    pub async fn list_all_repos(
        &self,
        org: &str,
        source: &dyn InstallationTokenSource,
    ) -> GitHubResult<Vec<Repo>> {
        let url = list_url(
            self.client,
            &format!("/orgs/{}/repos", org),
            &[],
            PageSize::REPOSITORIES,
        )?;
        let repos: Vec<Repository> =
            Traversal::new(self.client, source, url, PageSize::REPOSITORIES, "repositories")
                .collect()
                .await?;

        Ok(repos.into_iter().map(Repo::from).collect())
    }
}
