//! # GitHub Pull Request Statistics
//!
//! Collects pull request and review activity for every member of a GitHub
//! organization, authenticating as a GitHub App installation:
//! - App JWT signed from a PEM key and renewed in the background
//! - Installation access token minted on demand and re-minted on 401
//! - Sequential page-number pagination with short-page and time-boundary stops
//! - Per-user aggregation over a reporting window and CSV export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use integrations_github_stats::{
//!     AppAuthConfig, GitHubClient, GitHubConfig, GitHubStatsFetcher,
//!     InstallationTokenAgent, InstallationTokenSource, JwtAgent, StatsFetcher,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = AppAuthConfig::new("12345", "app.pem", 678, "acme");
//!     let (_shutdown, rx) = tokio::sync::mpsc::channel(1);
//!     let jwt = JwtAgent::start(&app, rx).await?;
//!
//!     let config = GitHubConfig::default();
//!     let tokens = Arc::new(InstallationTokenAgent::new(config.clone(), &app, jwt)?);
//!     tokens.generate_new().await?;
//!
//!     let fetcher = GitHubStatsFetcher::new(GitHubClient::new(config)?, tokens);
//!     for repo in fetcher.repos().await? {
//!         println!("{}", repo.full_name);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod types;

// Authentication
pub mod auth;

// HTTP client and transport
pub mod client;

// Pagination handling
pub mod pagination;

// API Services
pub mod services;

// Reporting
pub mod engine;
pub mod exporter;
pub mod stats;

// Observability
pub mod observability;

// Mocks for testing
pub mod mocks;

// Re-exports for convenience
pub use auth::{
    AssertionSource, InstallationTokenAgent, InstallationTokenSource, JwtAgent, ShutdownReceiver,
};
pub use client::GitHubClient;
pub use config::{AppAuthConfig, GitHubConfig, GitHubConfigBuilder, ReportConfig, StatsConfig};
pub use engine::Engine;
pub use errors::{GitHubError, GitHubErrorKind, GitHubResult};
pub use exporter::{CsvExporter, StatsExporter};
pub use services::{GitHubStatsFetcher, StatsFetcher};
pub use stats::{aggregate, ReportWindow, StatsTable};
pub use types::*;
