//! Test doubles for the credential traits and JSON fixtures for mock servers.

use crate::auth::{AssertionSource, InstallationTokenSource};
use crate::errors::{GitHubError, GitHubResult};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory [`InstallationTokenSource`].
///
/// Serves the first token until `generate_new` moves to the next one; stays
/// on the last once the list runs out.
#[derive(Debug)]
pub struct FakeTokenSource {
    account_name: String,
    tokens: Vec<String>,
    current: Mutex<usize>,
    generate_calls: AtomicUsize,
    failing: bool,
}

impl FakeTokenSource {
    /// Creates a source for `account_name` serving `tokens` in order.
    pub fn new<I, S>(account_name: &str, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.is_empty() {
            tokens.push(String::new());
        }
        Self {
            account_name: account_name.to_string(),
            tokens,
            current: Mutex::new(0),
            generate_calls: AtomicUsize::new(0),
            failing: false,
        }
    }

    /// Makes every `generate_new` fail with a credential error.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Number of `generate_new` calls so far, failed ones included.
    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    fn index(&self) -> std::sync::MutexGuard<'_, usize> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl InstallationTokenSource for FakeTokenSource {
    fn account_name(&self) -> &str {
        &self.account_name
    }

    async fn bearer(&self) -> SecretString {
        let idx = *self.index();
        SecretString::new(self.tokens[idx].clone())
    }

    async fn generate_new(&self) -> GitHubResult<()> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(GitHubError::credential("Installation token request failed").with_status(500));
        }

        let mut idx = self.index();
        *idx = (*idx + 1).min(self.tokens.len() - 1);
        Ok(())
    }
}

/// [`AssertionSource`] that always returns the same value.
#[derive(Debug, Clone)]
pub struct StaticAssertion(String);

impl StaticAssertion {
    /// Creates an assertion source serving `assertion`.
    pub fn new(assertion: impl Into<String>) -> Self {
        Self(assertion.into())
    }
}

#[async_trait]
impl AssertionSource for StaticAssertion {
    async fn bearer(&self) -> SecretString {
        SecretString::new(self.0.clone())
    }
}

/// JSON bodies shaped like GitHub responses.
pub mod fixtures {
    use crate::types::{PullRequestRecord, ReviewRecord};
    use chrono::{DateTime, Utc};
    use serde_json::{json, Value};

    /// A page of `count` organization members with ids starting at `first_id`.
    pub fn members_page(first_id: u64, count: usize) -> Value {
        Value::Array(
            (0..count as u64)
                .map(|i| {
                    let id = first_id + i;
                    json!({ "id": id, "login": format!("user{}", id), "type": "User" })
                })
                .collect(),
        )
    }

    /// A page of `count` repositories of `owner`.
    pub fn repos_page(owner: &str, first_id: u64, count: usize) -> Value {
        Value::Array(
            (0..count as u64)
                .map(|i| {
                    let id = first_id + i;
                    let name = format!("repo{}", id);
                    json!({
                        "id": id,
                        "name": name,
                        "full_name": format!("{}/{}", owner, name),
                        "private": false
                    })
                })
                .collect(),
        )
    }

    /// A page of `count` pull requests numbered down from `first_number`,
    /// all created at `created_at`.
    pub fn pulls_page(first_number: u64, count: usize, author: &str, created_at: &str) -> Value {
        Value::Array(
            (0..count as u64)
                .map(|i| {
                    let number = first_number - i;
                    json!({
                        "id": 1000 + number,
                        "number": number,
                        "state": "closed",
                        "user": { "id": 3, "login": author },
                        "created_at": created_at
                    })
                })
                .collect(),
        )
    }

    /// Single pull request detail.
    pub fn pull_request_detail(number: u64, additions: u64, deletions: u64, created_at: &str) -> Value {
        json!({
            "id": 1000 + number,
            "number": number,
            "additions": additions,
            "deletions": deletions,
            "changed_files": 2,
            "commits": 1,
            "created_at": created_at,
            "updated_at": created_at
        })
    }

    /// A page of reviews, one per `(reviewer, submitted_at)` pair.
    pub fn reviews_page(reviews: &[(&str, &str)]) -> Value {
        Value::Array(
            reviews
                .iter()
                .enumerate()
                .map(|(i, (login, submitted_at))| {
                    json!({
                        "id": 5000 + i as u64,
                        "state": "APPROVED",
                        "user": { "id": 100 + i as u64, "login": login },
                        "submitted_at": submitted_at
                    })
                })
                .collect(),
        )
    }

    /// Installation token issuance response.
    pub fn installation_token(token: &str) -> Value {
        json!({
            "token": token,
            "expires_at": "2030-01-01T00:00:00Z",
            "permissions": { "pull_requests": "read", "members": "read" },
            "repository_selection": "all"
        })
    }

    /// A collected pull request with no reviews.
    pub fn pull_request_record(username: &str, created: DateTime<Utc>) -> PullRequestRecord {
        PullRequestRecord {
            id: 1,
            repo_id: 10,
            repo_name: "widgets".to_string(),
            user_id: 3,
            username: username.to_string(),
            number: 1,
            additions: 10,
            deletions: 2,
            changed_files: 1,
            commits: 1,
            created_at: Some(created),
            updated_at: Some(created),
            reviews: Vec::<ReviewRecord>::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn test_fake_token_source_rotates() {
        let source = FakeTokenSource::new("acme", ["a", "b"]);
        assert_eq!(source.bearer().await.expose_secret(), "a");

        source.generate_new().await.unwrap();
        assert_eq!(source.bearer().await.expose_secret(), "b");

        source.generate_new().await.unwrap();
        assert_eq!(source.bearer().await.expose_secret(), "b");
        assert_eq!(source.generate_calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_source_keeps_counting() {
        let source = FakeTokenSource::new("acme", ["a", "b"]).failing();
        assert!(source.generate_new().await.is_err());
        assert_eq!(source.bearer().await.expose_secret(), "a");
        assert_eq!(source.generate_calls(), 1);
    }

    #[test]
    fn test_fixture_pages_have_requested_sizes() {
        assert_eq!(fixtures::members_page(1, 99).as_array().unwrap().len(), 99);
        assert_eq!(
            fixtures::pulls_page(40, 19, "octocat", "2024-01-10T09:00:00Z")
                .as_array()
                .unwrap()
                .len(),
            19
        );
    }
}
