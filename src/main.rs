use anyhow::Context;
use chrono::Local;
use integrations_github_stats::{
    CsvExporter, Engine, GitHubClient, GitHubStatsFetcher, InstallationTokenAgent,
    InstallationTokenSource, JwtAgent, ReportWindow, StatsConfig,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the variables may come from the environment.
    dotenvy::dotenv().ok();

    let config = StatsConfig::from_env().context("Failed to load configuration")?;
    config.logging.init()?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let jwt = JwtAgent::start(&config.app, shutdown_rx)
        .await
        .context("Failed to sign GitHub App assertion")?;

    let tokens: Arc<dyn InstallationTokenSource> = Arc::new(InstallationTokenAgent::new(
        config.github.clone(),
        &config.app,
        jwt,
    )?);
    let client = GitHubClient::new(config.github.clone())?;
    let fetcher = Arc::new(GitHubStatsFetcher::new(client, Arc::clone(&tokens)));

    let window = ReportWindow::from_config(&config.report, Local::now().date_naive())?;
    info!(
        org = %config.app.account_name,
        start = %window.start,
        end = %window.end,
        base = %window.base,
        "Starting report"
    );

    let engine = Engine::new(tokens, fetcher, Arc::new(CsvExporter::new()), window);
    let result = engine.run().await;

    shutdown_tx.send(()).await.ok();

    let path = result.context("Report generation failed")?;
    info!(path = %path.display(), "Report written");

    Ok(())
}
