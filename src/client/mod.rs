//! GitHub API client implementation.

use crate::auth::{bearer_header, InstallationTokenSource};
use crate::config::GitHubConfig;
use crate::errors::{GitHubError, GitHubResult};
use crate::observability::TracingHooks;
use crate::services::{OrganizationsService, PullRequestsService};
use bytes::Bytes;
use reqwest::{
    header::{ACCEPT, AUTHORIZATION, USER_AGENT},
    Client, Response, StatusCode,
};
use secrecy::ExposeSecret;
use std::time::Instant;

/// Builds the HTTP client shared by the token agent and the data client.
pub(crate) fn build_http(config: &GitHubConfig) -> GitHubResult<Client> {
    config.validate()?;

    Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|e| {
            GitHubError::configuration(format!("Failed to create HTTP client: {}", e))
        })
}

/// GitHub API client.
///
/// Issues authenticated GETs and recovers from exactly one kind of failure:
/// an expired installation token.
#[derive(Clone)]
pub struct GitHubClient {
    /// HTTP client.
    http: Client,
    /// Configuration.
    config: GitHubConfig,
}

impl GitHubClient {
    /// Creates a new GitHub client.
    pub fn new(config: GitHubConfig) -> GitHubResult<Self> {
        let http = build_http(&config)?;
        Ok(Self { http, config })
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Joins a path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    // Service accessors

    /// Gets the organizations service.
    pub fn organizations(&self) -> OrganizationsService<'_> {
        OrganizationsService::new(self)
    }

    /// Gets the pull requests service.
    pub fn pull_requests(&self) -> PullRequestsService<'_> {
        PullRequestsService::new(self)
    }

    /// Performs one authenticated GET and returns the raw body.
    ///
    /// A 401 triggers a single `generate_new` on `source` and one retry with
    /// the fresh token. Every other non-200 status fails immediately.
    pub async fn get(&self, uri: &str, source: &dyn InstallationTokenSource) -> GitHubResult<Bytes> {
        let started = Instant::now();
        TracingHooks::on_request_start("GET", uri);

        let response = self.send_get(uri, source).await?;
        let response = match response.status() {
            StatusCode::OK => response,
            StatusCode::UNAUTHORIZED => {
                TracingHooks::on_auth_rejected(uri);
                source.generate_new().await?;

                let retried = self.send_get(uri, source).await?;
                if retried.status() != StatusCode::OK {
                    let err = GitHubError::auth(uri, retried.status().as_u16());
                    TracingHooks::on_request_error("GET", uri, &err);
                    return Err(err);
                }
                retried
            }
            status => {
                let err = GitHubError::http(uri, status.as_u16());
                TracingHooks::on_request_error("GET", uri, &err);
                return Err(err);
            }
        };

        let body = response
            .bytes()
            .await
            .map_err(|e| GitHubError::transport(uri, e))?;

        TracingHooks::on_request_complete("GET", uri, StatusCode::OK.as_u16(), started.elapsed());
        Ok(body)
    }

    async fn send_get(&self, uri: &str, source: &dyn InstallationTokenSource) -> GitHubResult<Response> {
        let token = source.bearer().await;

        self.http
            .get(uri)
            .header(AUTHORIZATION, bearer_header(token.expose_secret()))
            .header(ACCEPT, &self.config.accept)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await
            .map_err(|e| {
                let err = GitHubError::transport(uri, e);
                TracingHooks::on_request_error("GET", uri, &err);
                err
            })
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GitHubErrorKind;
    use crate::mocks::FakeTokenSource;
    use test_case::test_case;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> GitHubClient {
        let config = GitHubConfig::builder()
            .base_url(server.uri())
            .build()
            .unwrap();
        GitHubClient::new(config).unwrap()
    }

    #[test]
    fn test_endpoint() {
        let client = GitHubClient::new(GitHubConfig::default()).unwrap();

        assert_eq!(
            client.endpoint("/orgs/acme/members"),
            "https://api.github.com/orgs/acme/members"
        );
    }

    #[tokio::test]
    async fn test_get_sends_bearer_and_preview_accept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme"))
            .and(header("Authorization", "Bearer ghs_first"))
            .and(header("Accept", "application/vnd.github.machine-man-preview+json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"login\":\"acme\"}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let tokens = FakeTokenSource::new("acme", ["ghs_first"]);

        let body = client.get(&client.endpoint("/orgs/acme"), &tokens).await.unwrap();
        assert_eq!(&body[..], b"{\"login\":\"acme\"}");
        assert_eq!(tokens.generate_calls(), 0);
    }

    #[test_case(403 ; "forbidden")]
    #[test_case(404 ; "not found")]
    #[test_case(500 ; "server error")]
    #[test_case(201 ; "non-200 success")]
    #[tokio::test]
    async fn test_get_other_status_is_http_error_without_retry(status: u16) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/repos"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let tokens = FakeTokenSource::new("acme", ["ghs_first"]);

        let err = client
            .get(&client.endpoint("/orgs/acme/repos"), &tokens)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), GitHubErrorKind::Http);
        assert_eq!(err.status_code(), Some(status));
        assert_eq!(tokens.generate_calls(), 0);
    }

    #[tokio::test]
    async fn test_get_transport_error() {
        // Nothing listens on the discard port.
        let config = GitHubConfig::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let client = GitHubClient::new(config).unwrap();
        let tokens = FakeTokenSource::new("acme", ["ghs_first"]);

        let err = client
            .get(&client.endpoint("/orgs/acme"), &tokens)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), GitHubErrorKind::Transport);
        assert!(err.is_transient());
    }
}
