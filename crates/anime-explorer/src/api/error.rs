//! Error type for calls against the Jikan API.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single API call
///
/// Every variant is a network failure from the caller's point of view; the
/// distinction only matters for logging.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS or body-read failure
    #[error("request failed: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Body was not the JSON shape we expect
    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Endpoint could not be turned into a URL
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
