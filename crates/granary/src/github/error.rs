//! Error types for GitHub API extraction.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur while fetching from the GitHub API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed at the transport level.
    #[error("http error: {0}")]
    Http(#[from] HttpError),

    /// Response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned a non-success response that is neither an auth failure
    /// nor a recoverable rate limit.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limit exhausted and the configured wait budget is spent.
    ///
    /// With the default unbounded policy this variant never surfaces; the
    /// fetch loop sleeps until the window resets and retries instead.
    #[error("rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// The token was rejected (HTTP 401). Never retried.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Endpoint path could not be joined onto the API base.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
    /// True if this error carries a rate-limit reset time.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }
}
