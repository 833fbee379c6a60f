// CLI errors and their user-facing messages

use cookroom_api::ApiError;
use cookroom_export::ExportError;
use cookroom_images::ImageError;
use cookroom_sessions::{FeedError, SessionError};
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend answered the analysis with a failure
    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl CliError {
    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!(
                    "Invalid argument: {}\n\nRun 'cookroom --help' for usage information.",
                    message
                )
            }
            CliError::Io(e) => format!("File operation failed: {}", e),
            CliError::Config(msg) => {
                format!(
                    "Configuration error: {}\n\nCheck ~/.cookroom/config/ or config/ in the current directory.",
                    msg
                )
            }
            CliError::NotFound(what) => format!("Not found: {}", what),
            CliError::Analysis(reason) => format!("Analysis failed: {}", reason),
            CliError::Api(e) => Self::api_message(e),
            CliError::Session(SessionError::Api(e)) => Self::api_message(e),
            CliError::Session(e) => e.to_string(),
            CliError::Export(e) => format!("Export failed: {}", e),
        }
    }

    fn api_message(err: &ApiError) -> String {
        if err.is_transport() {
            format!(
                "{}\n\nIs the backend running? Set COOKROOM_API_URL or pass --api-url.",
                err.user_message()
            )
        } else {
            err.user_message()
        }
    }

    /// Get technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

impl From<ImageError> for CliError {
    fn from(err: ImageError) -> Self {
        CliError::Session(err.into())
    }
}

impl From<FeedError> for CliError {
    fn from(err: FeedError) -> Self {
        CliError::Session(err.into())
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Config(format!("{:#}", err))
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_chain_is_kept() {
        let err = anyhow::anyhow!("bad yaml").context("loading export config");
        let cli: CliError = err.into();
        assert_eq!(cli.to_string(), "Configuration error: loading export config: bad yaml");
    }

    #[test]
    fn test_server_message_passes_through() {
        let err = CliError::Api(ApiError::Server {
            status: Some(422),
            message: "Prompt too long".to_string(),
        });
        assert_eq!(err.user_message(), "Prompt too long");
    }
}
