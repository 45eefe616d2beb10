//! Error types for the gamepulse proxy core.

use std::fmt;

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the proxy core.
///
/// The set is closed: every failure a route handler can see is one of these,
/// so the HTTP layer maps them to status codes without string matching.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A required secret is missing or still set to its placeholder value.
    #[error("{0}")]
    Configuration(String),

    /// Acquiring an upstream bearer credential failed.
    #[error("upstream auth failed: {0}")]
    UpstreamAuth(UpstreamFailure),

    /// An upstream data call failed (network, non-2xx status, decode).
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(UpstreamFailure),
}

impl Error {
    /// Upstream failure details, if this error came from an upstream call.
    pub fn upstream(&self) -> Option<&UpstreamFailure> {
        match self {
            Self::Configuration(_) => None,
            Self::UpstreamAuth(failure) | Self::UpstreamFetch(failure) => Some(failure),
        }
    }
}

/// Structured description of a failed upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    /// HTTP status returned by the upstream, if a response was received.
    pub status: Option<u16>,
    /// Short human-readable summary.
    pub message: String,
    /// Best-effort detail extracted from the upstream error body.
    pub detail: Option<String>,
}

impl UpstreamFailure {
    /// Failure with no HTTP status (transport or decode error).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            detail: None,
        }
    }
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.message, status)?,
            None => write!(f, "{}", self.message)?,
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl From<reqwest::Error> for UpstreamFailure {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "upstream request timed out".to_string()
        } else if err.is_decode() {
            format!("malformed upstream response: {err}")
        } else {
            format!("upstream request failed: {err}")
        };

        Self {
            status: err.status().map(|s| s.as_u16()),
            message,
            detail: None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::UpstreamFetch(err.into())
    }
}
