//! Error types for rulegate-github

use rulegate_core::RemoteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GithubError {
    /// Repository argument could not be parsed
    #[error("invalid repository '{0}': expected OWNER/NAME, HOST/OWNER/NAME or a URL")]
    InvalidRepository(String),

    /// Configured API base cannot carry path segments
    #[error("invalid API URL '{0}'")]
    InvalidApiUrl(String),

    /// 404 from the API
    #[error("not found: {0}")]
    NotFound(String),

    /// 401 or 403 from the API
    #[error("authentication failed ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Any other non-success status
    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The request did not complete
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body did not have the expected shape
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GithubError {
    fn from(err: reqwest::Error) -> Self {
        GithubError::Http(err.to_string())
    }
}

impl From<GithubError> for RemoteError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::NotFound(message) => RemoteError::NotFound(message),
            GithubError::Unauthorized { message, .. } => RemoteError::Unauthorized(message),
            GithubError::Api { status, message } => RemoteError::Status { status, message },
            GithubError::Http(message) => RemoteError::Transport(message),
            GithubError::Json(err) => RemoteError::InvalidResponse(err.to_string()),
            GithubError::InvalidRepository(input) => {
                RemoteError::InvalidResponse(format!("invalid repository '{input}'"))
            }
            GithubError::InvalidApiUrl(url) => {
                RemoteError::Transport(format!("invalid API URL '{url}'"))
            }
        }
    }
}
