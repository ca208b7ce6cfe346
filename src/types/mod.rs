//! Core data types.
//!
//! Wire types mirror the subset of GitHub's JSON that is read; fields the
//! API may omit are optional or defaulted. Record types are what the fetch
//! layer hands to aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// GitHub user (minimal representation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: u64,
    /// Username (login).
    pub login: String,
}

/// GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository ID.
    pub id: u64,
    /// Repository name.
    pub name: String,
    /// Full name (owner/repo).
    #[serde(default)]
    pub full_name: String,
}

/// Pull request as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull request ID.
    pub id: u64,
    /// Pull request number.
    pub number: u64,
    /// Author.
    pub user: Option<User>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
}

/// Pull request as returned by the single-PR endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestDetail {
    /// Lines added.
    #[serde(default)]
    pub additions: u64,
    /// Lines deleted.
    #[serde(default)]
    pub deletions: u64,
    /// Files changed.
    #[serde(default)]
    pub changed_files: u64,
    /// Commit count.
    #[serde(default)]
    pub commits: u64,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Pull request review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review ID.
    pub id: u64,
    /// Review state (APPROVED, CHANGES_REQUESTED, COMMENTED, ...).
    #[serde(default)]
    pub state: String,
    /// Reviewer.
    pub user: Option<User>,
    /// Submission time; absent for pending reviews.
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Organization member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// User ID.
    pub id: u64,
    /// Login.
    pub username: String,
}

impl From<User> for Member {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.login,
        }
    }
}

/// Organization repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    /// Repository ID.
    pub id: u64,
    /// Repository name.
    pub name: String,
    /// Full name (owner/repo).
    pub full_name: String,
}

impl From<Repository> for Repo {
    fn from(repo: Repository) -> Self {
        Self {
            id: repo.id,
            name: repo.name,
            full_name: repo.full_name,
        }
    }
}

/// A review attached to a collected pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Review ID.
    pub id: u64,
    /// Review state.
    pub state: String,
    /// Reviewer ID; 0 for deleted accounts.
    pub user_id: u64,
    /// Reviewer login; empty for deleted accounts.
    pub username: String,
    /// Submission time.
    pub submitted_at: Option<DateTime<Utc>>,
}

impl From<Review> for ReviewRecord {
    fn from(review: Review) -> Self {
        let (user_id, username) = split_user(review.user);
        Self {
            id: review.id,
            state: review.state,
            user_id,
            username,
            submitted_at: review.submitted_at,
        }
    }
}

/// A pull request with its detail counters and reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    /// Pull request ID.
    pub id: u64,
    /// Repository ID.
    pub repo_id: u64,
    /// Repository name.
    pub repo_name: String,
    /// Author ID.
    pub user_id: u64,
    /// Author login.
    pub username: String,
    /// Pull request number.
    pub number: u64,
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
    /// Files changed.
    pub changed_files: u64,
    /// Commit count.
    pub commits: u64,
    /// Creation time, from the detail endpoint.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
    /// Every review, in API order.
    pub reviews: Vec<ReviewRecord>,
}

impl PullRequestRecord {
    /// Combines a listed pull request with its detail and reviews.
    ///
    /// Author and identity come from the listing, counters and timestamps
    /// from the detail.
    pub fn assemble(
        repo: &Repo,
        summary: PullRequest,
        detail: PullRequestDetail,
        reviews: Vec<Review>,
    ) -> Self {
        let (user_id, username) = split_user(summary.user);
        Self {
            id: summary.id,
            repo_id: repo.id,
            repo_name: repo.name.clone(),
            user_id,
            username,
            number: summary.number,
            additions: detail.additions,
            deletions: detail.deletions,
            changed_files: detail.changed_files,
            commits: detail.commits,
            created_at: detail.created_at,
            updated_at: detail.updated_at,
            reviews: reviews.into_iter().map(ReviewRecord::from).collect(),
        }
    }
}

/// Per-user totals for one reporting window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    /// User ID.
    pub id: u64,
    /// Login.
    pub username: String,
    /// Pull requests opened in the window.
    pub pull_requests_created: u64,
    /// Reviews submitted in the window.
    pub pull_requests_reviewed: u64,
    /// Reviews received on pull requests opened in the window.
    pub reviews_on_pull_requests: u64,
    /// Lines added across opened pull requests.
    pub additions: u64,
    /// Lines deleted across opened pull requests.
    pub deletions: u64,
    /// Files changed across opened pull requests.
    pub changed_files: u64,
    /// Commits across opened pull requests.
    pub commits: u64,
}

impl UserStats {
    /// Zeroed stats for a user.
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            ..Default::default()
        }
    }
}

// Ghost or deleted accounts come back with `user: null`.
fn split_user(user: Option<User>) -> (u64, String) {
    user.map(|u| (u.id, u.login)).unwrap_or_default()
}
