//! Error types for image attachments.

use thiserror::Error;

/// Result type for image operations.
pub type ImageResult<T> = Result<T, ImageError>;

/// Errors that can occur while attaching images.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The batch would push the attachment count over the limit; nothing was added.
    #[error("You can attach at most {max} images ({current} attached, {incoming} more selected)")]
    LimitExceeded {
        current: usize,
        incoming: usize,
        max: usize,
    },

    /// Image format is not supported.
    #[error("Format not supported: {0}. Supported formats: PNG, JPG, GIF, WebP")]
    FormatNotSupported(String),

    /// Image file exceeds the configured maximum size.
    #[error("File too large: {size_mb:.1} MB exceeds maximum of {max_mb} MB")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    /// File is not a valid image.
    #[error("Invalid image file: {0}")]
    InvalidFile(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_yaml::Error> for ImageError {
    fn from(err: serde_yaml::Error) -> Self {
        ImageError::ConfigError(err.to_string())
    }
}
