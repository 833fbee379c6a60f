//! Backend client error types

use thiserror::Error;

/// Result type for backend operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors raised while talking to the recipe backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, body stream)
    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an error status or an error payload
    #[error("Server error{}: {message}", fmt_status(.status))]
    Server {
        status: Option<u16>,
        message: String,
    },

    /// The response body did not match the contract
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A request part could not be built (e.g. bad MIME type)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl ApiError {
    /// True when the failure happened before the server could answer
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::Transport(_)
                | ApiError::InvalidUrl(_)
                | ApiError::InvalidRequest(_)
                | ApiError::Build(_)
                | ApiError::Config(_)
        )
    }

    /// HTTP status reported by the server, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => *status,
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message suitable for a one-shot user notification
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { message, .. } => message.clone(),
            ApiError::Transport(e) if e.is_timeout() => "The server took too long to respond".to_string(),
            ApiError::Transport(_) => "Could not reach the server".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ApiError {
    fn from(err: serde_yaml::Error) -> Self {
        ApiError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Config(err.to_string())
    }
}
