//! Error types for session operations

use cookroom_api::ApiError;
use cookroom_export::ExportError;
use cookroom_images::ImageError;
use thiserror::Error;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Voice dictation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DictationError {
    /// No speech recognition on this platform
    #[error("Voice input is not supported on this device")]
    Unsupported,

    /// The recognizer reported an error
    #[error("Voice input failed: {0}")]
    Platform(String),
}

/// A favorite toggle the server refused; local state was rolled back
#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("Could not update favorite '{name}': {}", .source.user_message())]
    Rejected {
        name: String,
        #[source]
        source: ApiError,
    },
}

impl FavoriteError {
    pub fn name(&self) -> &str {
        match self {
            FavoriteError::Rejected { name, .. } => name,
        }
    }
}

/// Feed page fetch failures
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to load page: {}", .0.user_message())]
    Fetch(#[from] ApiError),
}

/// Errors that can occur in session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Dictation(#[from] DictationError),

    #[error(transparent)]
    Favorite(#[from] FavoriteError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The named recipe is not part of the current result
    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for SessionError {
    fn from(err: serde_yaml::Error) -> Self {
        SessionError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorite_error_uses_server_message() {
        let err = FavoriteError::Rejected {
            name: "Soup".to_string(),
            source: ApiError::Server {
                status: Some(400),
                message: "Favorite not found".to_string(),
            },
        };
        assert_eq!(err.to_string(), "Could not update favorite 'Soup': Favorite not found");
        assert_eq!(err.name(), "Soup");
    }

    #[test]
    fn test_session_error_is_transparent() {
        let err: SessionError = DictationError::Unsupported.into();
        assert_eq!(err.to_string(), "Voice input is not supported on this device");
    }
}
