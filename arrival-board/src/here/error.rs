//! HERE client error types.

use std::fmt;

use crate::aggregator::SourceError;
use crate::builder::DiscoveryError;

/// Errors from the HERE HTTP client.
#[derive(Debug)]
pub enum HereError {
    /// HTTP request failed (network error, timeout, etc.)
    Http(reqwest::Error),

    /// JSON deserialization failed
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code
    ApiError { status: u16, message: String },

    /// Rate limited by the API
    RateLimited,

    /// Invalid API key or unauthorized
    Unauthorized,
}

impl fmt::Display for HereError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HereError::Http(e) => write!(f, "HTTP error: {e}"),
            HereError::Json { message, body } => {
                write!(f, "JSON parse error: {message}")?;
                if let Some(body) = body {
                    write!(f, " (body: {body})")?;
                }
                Ok(())
            }
            HereError::ApiError { status, message } => {
                write!(f, "API error {status}: {message}")
            }
            HereError::RateLimited => write!(f, "rate limited by HERE API"),
            HereError::Unauthorized => write!(f, "unauthorized (invalid API key)"),
        }
    }
}

impl std::error::Error for HereError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HereError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HereError {
    fn from(err: reqwest::Error) -> Self {
        HereError::Http(err)
    }
}

impl From<HereError> for SourceError {
    fn from(err: HereError) -> Self {
        match err {
            HereError::Json { .. } => SourceError::Malformed(err.to_string()),
            other => SourceError::Upstream(other.to_string()),
        }
    }
}

impl From<HereError> for DiscoveryError {
    fn from(err: HereError) -> Self {
        match err {
            HereError::RateLimited => DiscoveryError::RateLimited,
            other => DiscoveryError::Upstream(other.to_string()),
        }
    }
}
