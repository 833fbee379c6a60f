//! Image attachments for the Cooking Room recipe session.
//!
//! This crate provides:
//! - Type filtering (declared MIME, extension, magic bytes)
//! - A capped attachment set with all-or-nothing batches
//! - Preview handles with explicit, audited release

pub mod attachments;
pub mod config;
pub mod error;
pub mod formats;
pub mod preview;

pub use attachments::{AddOutcome, Attachment, AttachmentId, AttachmentManager, SelectedFile, SkippedFile};
pub use config::ImageConfig;
pub use error::{ImageError, ImageResult};
pub use formats::ImageFormat;
pub use preview::{PreviewData, PreviewHandle, PreviewRegistry};
