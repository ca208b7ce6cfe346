//! Logging setup and tracing hooks for credential and fetch operations.

use crate::errors::{GitHubError, GitHubResult};
use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default verbosity: credential refreshes and report progress, but not
/// per-request or per-page events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Every request, page and assertion renewal.
    Debug,
    /// Refreshes, collection progress and the written report.
    #[default]
    Info,
    /// Failed requests only.
    Warn,
}

impl LogLevel {
    /// The `EnvFilter` directive for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
        }
    }
}

impl FromStr for LogLevel {
    type Err = GitHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            other => Err(GitHubError::configuration(format!("Unknown LOG_LEVEL: {}", other))),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
    /// Compact single-line format
    Compact,
}

impl FromStr for LogFormat {
    type Err = GitHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(GitHubError::configuration(format!("Unknown LOG_FORMAT: {}", other))),
        }
    }
}

/// Logging configuration for the report binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingConfig {
    /// Level used when `RUST_LOG` is unset.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Creates a logging configuration.
    pub fn new(level: LogLevel, format: LogFormat) -> Self {
        Self { level, format }
    }

    /// Filter directives: `rust_log` verbatim when it is set, otherwise the
    /// configured level.
    pub fn directives(&self, rust_log: Option<&str>) -> String {
        match rust_log.map(str::trim).filter(|d| !d.is_empty()) {
            Some(directives) => directives.to_string(),
            None => self.level.as_str().to_string(),
        }
    }

    /// Installs the global subscriber.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `RUST_LOG` does not parse or a
    /// subscriber is already installed.
    pub fn init(self) -> GitHubResult<()> {
        let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        let filter = EnvFilter::try_new(self.directives(rust_log.as_deref())).map_err(|e| {
            GitHubError::configuration(format!("Invalid {}: {}", EnvFilter::DEFAULT_ENV, e))
        })?;

        let registry = tracing_subscriber::registry().with(filter);
        let result = match self.format {
            LogFormat::Pretty => registry.with(fmt::layer().with_ansi(true)).try_init(),
            LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
            LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        };

        result.map_err(|e| {
            GitHubError::configuration(format!("Failed to initialize logging: {}", e))
        })
    }
}

/// Tracing hooks for credential and API operations.
pub struct TracingHooks;

impl TracingHooks {
    /// Logs the start of an API request.
    pub fn on_request_start(method: &str, url: &str) {
        debug!(
            method = %method,
            url = %url,
            "GitHub API request started"
        );
    }

    /// Logs the completion of an API request.
    pub fn on_request_complete(method: &str, url: &str, status: u16, duration: Duration) {
        debug!(
            method = %method,
            url = %url,
            status = status,
            duration_ms = duration.as_millis() as u64,
            "GitHub API request completed"
        );
    }

    /// Logs a request error.
    pub fn on_request_error(method: &str, url: &str, error: &GitHubError) {
        warn!(
            method = %method,
            url = %url,
            kind = %error.kind(),
            status = ?error.status_code(),
            error = %error,
            "GitHub API request failed"
        );
    }

    /// Logs a 401 that is about to trigger an installation token refresh.
    pub fn on_auth_rejected(url: &str) {
        info!(url = %url, "Installation token rejected, refreshing");
    }

    /// Logs a newly minted installation token.
    pub fn on_installation_token_refresh(installation_id: u64, expires_at: Option<DateTime<Utc>>) {
        info!(
            installation_id = installation_id,
            expires_at = ?expires_at,
            "Installation token refreshed"
        );
    }

    /// Logs a newly signed App assertion.
    pub fn on_assertion_renewed(app_id: &str, generation: u64) {
        debug!(app_id = %app_id, generation = generation, "App assertion renewed");
    }

    /// Logs a decoded page.
    pub fn on_page_fetched(label: &str, page: u32, records: usize) {
        debug!(label = %label, page = page, records = records, "Page fetched");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_level_applies_without_rust_log() {
        let config = LoggingConfig::new(LogLevel::Warn, LogFormat::Json);
        assert_eq!(config.directives(None), "warn");
        assert_eq!(config.directives(Some("  ")), "warn");
    }

    #[test]
    fn test_rust_log_replaces_level() {
        let config = LoggingConfig::default();
        let directives = config.directives(Some("debug"));

        assert_eq!(directives, "debug");
        let filter = EnvFilter::try_new(directives).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_parse_level_and_format() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("verbose".parse::<LogLevel>().is_err());
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_second_init_is_configuration_error() {
        let _ = LoggingConfig::new(LogLevel::Info, LogFormat::Compact).init();

        let err = LoggingConfig::default().init().unwrap_err();
        assert_eq!(err.kind(), crate::errors::GitHubErrorKind::Configuration);
    }

    #[test]
    fn test_hooks_do_not_panic() {
        let err = GitHubError::http("https://api.github.com/orgs/acme", 404);
        TracingHooks::on_request_start("GET", "https://api.github.com/orgs/acme");
        TracingHooks::on_request_error("GET", "https://api.github.com/orgs/acme", &err);
        TracingHooks::on_installation_token_refresh(1, None);
        TracingHooks::on_assertion_renewed("4242", 3);
        TracingHooks::on_page_fetched("members", 1, 0);
    }
}
