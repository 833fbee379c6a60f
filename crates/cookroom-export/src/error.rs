//! Error types for recipe export.

use thiserror::Error;

use crate::region::RegionHandle;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors raised by the export pipeline.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The handle does not name a mounted region.
    #[error("Region not found: {0}")]
    RegionNotFound(RegionHandle),

    /// Rasterization or document assembly failed.
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// A remote image could not be fetched or decoded.
    #[error("Image unavailable: {0}")]
    ImageUnavailable(String),

    /// Writing the artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_yaml::Error> for ExportError {
    fn from(err: serde_yaml::Error) -> Self {
        ExportError::Config(err.to_string())
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::ExportFailed(format!("image encoding: {err}"))
    }
}
