//! Configuration types for the GitHub statistics client.

use crate::errors::GitHubError;
use crate::observability::{LogFormat, LogLevel, LoggingConfig};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;

/// Default GitHub API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Accept header sent with every request (GitHub App preview media type).
pub const DEFAULT_ACCEPT: &str = "application/vnd.github.machine-man-preview+json";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(23);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default User-Agent header.
pub const DEFAULT_USER_AGENT: &str = "integrations-github-stats/0.1.0";

/// Lifetime of a signed App assertion.
pub const JWT_VALIDITY: Duration = Duration::from_secs(10 * 60);

/// Default interval between App assertion renewals.
pub const DEFAULT_RENEWAL_INTERVAL: Duration = Duration::from_secs(9 * 60);

/// Default look-back, in days before the start date, for pull request traversal.
pub const DEFAULT_BASE_DAYS: i64 = 30;

/// Largest accepted `BASE` magnitude, in days.
pub const MAX_BASE_DAYS: i64 = 36_500;

/// Date format used by `START_DATE` / `END_DATE` and report file names.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base URL.
    pub base_url: String,
    /// Accept header.
    pub accept: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl GitHubConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> GitHubConfigBuilder {
        GitHubConfigBuilder::new()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), GitHubError> {
        if self.base_url.is_empty() {
            return Err(GitHubError::configuration("Base URL cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(GitHubError::configuration(
                "Base URL must start with http:// or https://",
            ));
        }

        if self.user_agent.is_empty() {
            return Err(GitHubError::configuration("User-Agent is required by GitHub API"));
        }

        if self.timeout.is_zero() {
            return Err(GitHubError::configuration("Request timeout must be non-zero"));
        }

        Ok(())
    }

    /// Joins a path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

/// Builder for GitHubConfig.
#[derive(Debug, Default)]
pub struct GitHubConfigBuilder {
    base_url: Option<String>,
    accept: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl GitHubConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the Accept header.
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<GitHubConfig, GitHubError> {
        let config = GitHubConfig {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            accept: self.accept.unwrap_or_else(|| DEFAULT_ACCEPT.to_string()),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        config.validate()?;
        Ok(config)
    }
}

/// GitHub App identity and installation scope.
#[derive(Debug, Clone)]
pub struct AppAuthConfig {
    /// GitHub App ID, used as the JWT issuer.
    pub app_id: String,
    /// Path to the App's PEM private key.
    pub private_key_path: PathBuf,
    /// Installation to mint access tokens for.
    pub installation_id: u64,
    /// Organization the installation belongs to.
    pub account_name: String,
    /// How often the App assertion is re-signed.
    pub renewal_interval: Duration,
}

impl AppAuthConfig {
    /// Creates a config with the default renewal interval.
    pub fn new(
        app_id: impl Into<String>,
        private_key_path: impl Into<PathBuf>,
        installation_id: u64,
        account_name: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            private_key_path: private_key_path.into(),
            installation_id,
            account_name: account_name.into(),
            renewal_interval: DEFAULT_RENEWAL_INTERVAL,
        }
    }

    /// Sets the renewal interval.
    pub fn with_renewal_interval(mut self, interval: Duration) -> Self {
        self.renewal_interval = interval;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), GitHubError> {
        if self.app_id.trim().is_empty() {
            return Err(GitHubError::configuration("GitHub App ID is required"));
        }
        if self.account_name.trim().is_empty() {
            return Err(GitHubError::configuration("Account name is required"));
        }
        if self.private_key_path.as_os_str().is_empty() {
            return Err(GitHubError::configuration("Private key path is required"));
        }
        // A renewal that lands after expiry leaves a window with no valid assertion.
        if self.renewal_interval.is_zero() || self.renewal_interval >= JWT_VALIDITY {
            return Err(GitHubError::configuration(format!(
                "Renewal interval must be between 0 and {}s",
                JWT_VALIDITY.as_secs()
            )));
        }
        Ok(())
    }
}

/// Reporting window as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// First day of the reporting window.
    pub start_date: NaiveDate,
    /// Last day of the reporting window; today when unset.
    pub end_date: Option<NaiveDate>,
    /// Days before `start_date` after which pull requests are still traversed.
    pub base_days: i64,
}

/// Everything the binary needs, as read from the environment.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// HTTP client settings.
    pub github: GitHubConfig,
    /// App credentials.
    pub app: AppAuthConfig,
    /// Reporting window.
    pub report: ReportConfig,
    /// Log level and output format.
    pub logging: LoggingConfig,
}

impl StatsConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, GitHubError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GitHubError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| {
                GitHubError::configuration(format!("Environment variable {} not set", key))
            })
        };

        let installation_id = require("INSTALLATION_ID")?;
        let installation_id: u64 = installation_id.parse().map_err(|_| {
            GitHubError::configuration(format!("Invalid installation id: {}", installation_id))
        })?;

        let mut app = AppAuthConfig::new(
            require("GITHUB_APP_ID")?,
            require("GITHUB_APP_PRIVATE_KEY")?,
            installation_id,
            require("ACCOUNT_NAME")?,
        );
        if let Some(secs) = get("JWT_RENEWAL_INTERVAL_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                GitHubError::configuration(format!("Invalid renewal interval: {}", secs))
            })?;
            app = app.with_renewal_interval(Duration::from_secs(secs));
        }
        app.validate()?;

        let mut github = GitHubConfig::builder();
        if let Some(url) = get("GITHUB_API_URL") {
            github = github.base_url(url);
        }
        let github = github.build()?;

        let start_date = parse_date("START_DATE", &require("START_DATE")?)?;
        let end_date = get("END_DATE")
            .map(|v| parse_date("END_DATE", &v))
            .transpose()?;
        let base_days = match get("BASE") {
            Some(v) => v
                .parse::<i64>()
                .ok()
                .filter(|days| (-MAX_BASE_DAYS..=MAX_BASE_DAYS).contains(days))
                .ok_or_else(|| {
                    GitHubError::configuration(format!(
                        "Invalid BASE: {} (expected days within ±{})",
                        v, MAX_BASE_DAYS
                    ))
                })?,
            None => DEFAULT_BASE_DAYS,
        };

        let logging = LoggingConfig::new(
            get("LOG_LEVEL")
                .map(|v| v.parse::<LogLevel>())
                .transpose()?
                .unwrap_or_default(),
            get("LOG_FORMAT")
                .map(|v| v.parse::<LogFormat>())
                .transpose()?
                .unwrap_or_default(),
        );

        Ok(Self {
            github,
            app,
            report: ReportConfig {
                start_date,
                end_date,
                base_days,
            },
            logging,
        })
    }
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate, GitHubError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        GitHubError::configuration(format!("Invalid {} {:?}: expected YYYY-MM-DD", key, value))
            .with_cause(e)
    })
}
