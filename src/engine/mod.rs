//! Report orchestration.

use crate::auth::InstallationTokenSource;
use crate::errors::GitHubResult;
use crate::exporter::StatsExporter;
use crate::services::StatsFetcher;
use crate::stats::{aggregate, ReportWindow};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Runs one report: fetch, aggregate, export.
pub struct Engine {
    tokens: Arc<dyn InstallationTokenSource>,
    fetcher: Arc<dyn StatsFetcher>,
    exporter: Arc<dyn StatsExporter>,
    window: ReportWindow,
    output_dir: PathBuf,
}

impl Engine {
    /// Creates an engine writing into the current directory.
    pub fn new(
        tokens: Arc<dyn InstallationTokenSource>,
        fetcher: Arc<dyn StatsFetcher>,
        exporter: Arc<dyn StatsExporter>,
        window: ReportWindow,
    ) -> Self {
        Self {
            tokens,
            fetcher,
            exporter,
            window,
            output_dir: PathBuf::from("."),
        }
    }

    /// Sets the directory the report is written to.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// The reporting window.
    pub fn window(&self) -> &ReportWindow {
        &self.window
    }

    /// Produces the report and returns the path it was written to.
    pub async fn run(&self) -> GitHubResult<PathBuf> {
        self.tokens.generate_new().await?;

        info!(org = %self.tokens.account_name(), "Fetching organization members");
        let members = self.fetcher.members().await?;

        info!(org = %self.tokens.account_name(), "Fetching organization repositories");
        let repos = self.fetcher.repos().await?;
        info!(repositories = repos.len(), "Repositories found");

        info!(base = %self.window.base, "Fetching pull requests");
        let prs = self.fetcher.pull_requests(&repos, self.window.base).await?;

        info!(pull_requests = prs.len(), members = members.len(), "Generating stats");
        let stats = aggregate(&prs, &members, &self.window);

        let path = self.output_dir.join(self.window.filename());
        self.exporter.export(&stats, &path)?;
        info!(path = %path.display(), users = stats.len(), "Stats exported");

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::errors::{GitHubError, GitHubErrorKind};
    use crate::exporter::MockStatsExporter;
    use crate::mocks::{fixtures, FakeTokenSource};
    use crate::services::MockStatsFetcher;
    use crate::types::{Member, Repo};
    use chrono::{NaiveDate, TimeZone, Utc};
    use mockall::Sequence;

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

    fn repos() -> Vec<Repo> {
        vec![Repo {
            id: 10,
            name: "widgets".to_string(),
            full_name: "acme/widgets".to_string(),
        }]
    }

    #[tokio::test]
    async fn test_run_fetches_in_order_and_exports() {
        let w = window();
        let mut seq = Sequence::new();
        let mut fetcher = MockStatsFetcher::new();
        fetcher
            .expect_members()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| {
                Ok(vec![Member {
                    id: 42,
                    username: "idle".to_string(),
                }])
            });
        fetcher
            .expect_repos()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(repos()));
        fetcher
            .expect_pull_requests()
            .withf(move |repos, base| repos.len() == 1 && repos[0].name == "widgets" && *base == w.base)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![fixtures::pull_request_record("octocat", Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap())]));

        let mut exporter = MockStatsExporter::new();
        exporter
            .expect_export()
            .withf(|stats, path| {
                stats.len() == 2
                    && stats["octocat"].pull_requests_created == 1
                    && path.ends_with("results_2024-01-01_to_2024-02-01.csv")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let tokens = Arc::new(FakeTokenSource::new("acme", ["ghs_first", "ghs_second"]));
        let engine = Engine::new(tokens.clone(), Arc::new(fetcher), Arc::new(exporter), w)
            .with_output_dir("/tmp/reports");

        let path = engine.run().await.unwrap();

        assert_eq!(path, PathBuf::from("/tmp/reports/results_2024-01-01_to_2024-02-01.csv"));
        assert_eq!(tokens.generate_calls(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_when_token_cannot_be_minted() {
        // No expectations: any fetch would panic.
        let fetcher = MockStatsFetcher::new();
        let exporter = MockStatsExporter::new();
        let tokens = Arc::new(FakeTokenSource::new("acme", ["ghs_first"]).failing());

        let engine = Engine::new(tokens, Arc::new(fetcher), Arc::new(exporter), window());

        let err = engine.run().await.unwrap_err();
        assert_eq!(err.kind(), GitHubErrorKind::Credential);
    }

    #[tokio::test]
    async fn test_run_propagates_fetch_errors_without_exporting() {
        let mut fetcher = MockStatsFetcher::new();
        fetcher.expect_members().returning(|| Ok(vec![]));
        fetcher
            .expect_repos()
            .returning(|| Err(GitHubError::http("https://api.github.com/orgs/acme/repos", 404)));
        let exporter = MockStatsExporter::new();
        let tokens = Arc::new(FakeTokenSource::new("acme", ["ghs_first"]));

        let engine = Engine::new(tokens, Arc::new(fetcher), Arc::new(exporter), window());

        let err = engine.run().await.unwrap_err();
        assert_eq!(err.kind(), GitHubErrorKind::Http);
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn test_run_surfaces_export_failure() {
        let mut fetcher = MockStatsFetcher::new();
        fetcher.expect_members().returning(|| Ok(vec![]));
        fetcher.expect_repos().returning(|| Ok(vec![]));
        fetcher
            .expect_pull_requests()
            .withf(|repos, _| repos.is_empty())
            .returning(|_, _| Ok(vec![]));

        let mut exporter = MockStatsExporter::new();
        exporter.expect_export().returning(|_, path| {
            Err(GitHubError::export(
                format!("Failed to create {}", path.display()),
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ))
        });
        let tokens = Arc::new(FakeTokenSource::new("acme", ["ghs_first"]));

        let engine = Engine::new(tokens, Arc::new(fetcher), Arc::new(exporter), window());

        let err = engine.run().await.unwrap_err();
        assert_eq!(err.kind(), GitHubErrorKind::Export);
    }
}
