//! End-to-end report generation against a mock GitHub.

#[cfg(test)]
mod report_tests {
    use chrono::NaiveDate;
    use integrations_github_stats::mocks::{fixtures, StaticAssertion};
    use integrations_github_stats::{
        AppAuthConfig, CsvExporter, Engine, GitHubClient, GitHubConfig, GitHubErrorKind,
        GitHubStatsFetcher, InstallationTokenAgent, InstallationTokenSource, ReportConfig,
        ReportWindow,
    };
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CREATED: &str = "2024-01-10T09:00:00Z";

    fn window() -> ReportWindow {
        ReportWindow::from_config(
            &ReportConfig {
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
                base_days: 30,
            },
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        )
        .unwrap()
    }

    async fn mount_get(server: &MockServer, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("Authorization", "Bearer ghs_live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mock_github() -> MockServer {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/app/installations/77/access_tokens"))
            .respond_with(ResponseTemplate::new(201).set_body_json(fixtures::installation_token("ghs_live")))
            .expect(1)
            .mount(&server)
            .await;

        mount_get(&server, "/orgs/acme/members", fixtures::members_page(1, 3)).await;
        mount_get(&server, "/orgs/acme/repos", fixtures::repos_page("acme", 10, 1)).await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/repo10/pulls"))
            .and(query_param("state", "all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::pulls_page(2, 2, "user1", CREATED)))
            .mount(&server)
            .await;
        mount_get(&server, "/repos/acme/repo10/pulls/2", fixtures::pull_request_detail(2, 10, 1, CREATED)).await;
        mount_get(&server, "/repos/acme/repo10/pulls/1", fixtures::pull_request_detail(1, 5, 2, CREATED)).await;
        mount_get(
            &server,
            "/repos/acme/repo10/pulls/2/reviews",
            fixtures::reviews_page(&[("user2", "2024-01-11T09:00:00Z"), ("user2", "2024-03-01T09:00:00Z")]),
        )
        .await;
        mount_get(&server, "/repos/acme/repo10/pulls/1/reviews", fixtures::reviews_page(&[])).await;

        server
    }

    fn engine_for(server: &MockServer, output_dir: &std::path::Path) -> Engine {
        let config = GitHubConfig::builder()
            .base_url(server.uri())
            .build()
            .unwrap();
        let app = AppAuthConfig::new("4242", "unused.pem", 77, "acme");

        let tokens: Arc<dyn InstallationTokenSource> = Arc::new(
            InstallationTokenAgent::new(config.clone(), &app, Arc::new(StaticAssertion::new("signed-jwt")))
                .unwrap(),
        );
        let fetcher = Arc::new(GitHubStatsFetcher::new(
            GitHubClient::new(config).unwrap(),
            Arc::clone(&tokens),
        ));

        Engine::new(tokens, fetcher, Arc::new(CsvExporter::new()), window()).with_output_dir(output_dir)
    }

    #[tokio::test]
    async fn test_report_written_as_csv() {
        let server = mock_github().await;
        let dir = tempfile::tempdir().unwrap();

        let written = engine_for(&server, dir.path()).run().await.unwrap();

        assert_eq!(written, dir.path().join("results_2024-01-01_to_2024-02-01.csv"));
        assert_eq!(
            std::fs::read_to_string(&written).unwrap(),
            "username,Pull Requests Created,Pull Requests Reviewed,Reviews on Pull Requests,Additions,Deletions,Files Changed,Total Commits\n\
             user1,2,0,2,15,3,4,2\n\
             user2,0,1,0,0,0,0,0\n\
             user3,0,0,0,0,0,0,0\n"
        );
    }

    #[tokio::test]
    async fn test_report_fails_when_a_detail_is_missing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app/installations/77/access_tokens"))
            .respond_with(ResponseTemplate::new(201).set_body_json(fixtures::installation_token("ghs_live")))
            .mount(&server)
            .await;
        mount_get(&server, "/orgs/acme/members", fixtures::members_page(1, 1)).await;
        mount_get(&server, "/orgs/acme/repos", fixtures::repos_page("acme", 10, 1)).await;
        mount_get(&server, "/repos/acme/repo10/pulls", fixtures::pulls_page(1, 1, "user1", CREATED)).await;

        let dir = tempfile::tempdir().unwrap();
        let err = engine_for(&server, dir.path()).run().await.unwrap_err();

        assert_eq!(err.kind(), GitHubErrorKind::Http);
        assert_eq!(err.status_code(), Some(404));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
