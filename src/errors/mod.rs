//! Error types for the GitHub statistics client.

use std::fmt;
use thiserror::Error;

/// Result type alias for GitHub operations.
pub type GitHubResult<T> = Result<T, GitHubError>;

/// Error kinds for categorizing GitHub errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// Private key could not be read or parsed, signing failed, or the
    /// installation token could not be issued.
    Credential,
    /// Network-level failure, including request timeouts.
    Transport,
    /// Authentication rejected even after a token refresh and retry.
    Auth,
    /// Any other non-success HTTP status.
    Http,
    /// Response payload did not match the expected JSON shape.
    Decode,
    /// Invalid or missing configuration.
    Configuration,
    /// Statistics could not be written out.
    Export,
}

impl fmt::Display for GitHubErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credential => write!(f, "credential"),
            Self::Transport => write!(f, "transport"),
            Self::Auth => write!(f, "auth"),
            Self::Http => write!(f, "http"),
            Self::Decode => write!(f, "decode"),
            Self::Configuration => write!(f, "configuration"),
            Self::Export => write!(f, "export"),
        }
    }
}

/// GitHub API error with detailed information.
#[derive(Error, Debug)]
pub struct GitHubError {
    /// Error kind.
    kind: GitHubErrorKind,
    /// Error message.
    message: String,
    /// HTTP status code.
    status_code: Option<u16>,
    /// Underlying cause.
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for GitHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(code) = self.status_code {
            write!(f, " (HTTP {})", code)?;
        }
        Ok(())
    }
}

impl GitHubError {
    /// Creates a new GitHub error.
    pub fn new(kind: GitHubErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            cause: None,
        }
    }

    /// Sets the HTTP status code.
    pub fn with_status(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Gets the error kind.
    pub fn kind(&self) -> GitHubErrorKind {
        self.kind
    }

    /// Gets the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Gets the HTTP status code.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Returns true if the failure may go away on its own (network hiccup).
    ///
    /// Nothing in this crate retries on it; callers decide.
    pub fn is_transient(&self) -> bool {
        self.kind == GitHubErrorKind::Transport
    }

    // Convenience constructors

    /// Creates a credential error.
    pub fn credential(message: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::Credential, message)
    }

    /// Creates a transport error from a failed request.
    pub fn transport(uri: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request to {} timed out", uri)
        } else {
            format!("request to {} failed", uri)
        };
        Self::new(GitHubErrorKind::Transport, message).with_cause(err)
    }

    /// Creates an error for a request rejected after a credential refresh.
    pub fn auth(uri: &str, status: u16) -> Self {
        Self::new(
            GitHubErrorKind::Auth,
            format!("{} still rejected after refreshing the installation token", uri),
        )
        .with_status(status)
    }

    /// Creates an error for an unexpected HTTP status.
    pub fn http(uri: &str, status: u16) -> Self {
        Self::new(
            GitHubErrorKind::Http,
            format!("unexpected response status from {}", uri),
        )
        .with_status(status)
    }

    /// Creates a decode error.
    pub fn decode(what: impl fmt::Display, err: serde_json::Error) -> Self {
        Self::new(GitHubErrorKind::Decode, format!("failed to decode {}", what)).with_cause(err)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::Configuration, message)
    }

    /// Creates an export error.
    pub fn export(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::new(GitHubErrorKind::Export, message).with_cause(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GitHubError::new(GitHubErrorKind::Http, "Repository not found").with_status(404);

        let display = format!("{}", error);
        assert!(display.contains("http"));
        assert!(display.contains("Repository not found"));
        assert!(display.contains("404"));
    }

    #[test]
    fn test_auth_error_keeps_status() {
        let error = GitHubError::auth("https://api.github.com/orgs/acme/members", 401);

        assert_eq!(error.kind(), GitHubErrorKind::Auth);
        assert_eq!(error.status_code(), Some(401));
        assert!(!error.is_transient());
    }

    #[test]
    fn test_decode_error_has_source() {
        let json_err = serde_json::from_str::<Vec<u32>>("{not json").unwrap_err();
        let error = GitHubError::decode("members page 3", json_err);

        assert_eq!(error.kind(), GitHubErrorKind::Decode);
        assert!(std::error::Error::source(&error).is_some());
        assert!(error.to_string().contains("members page 3"));
    }
}
