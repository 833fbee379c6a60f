//! Recipe export for Cooking Room.
//!
//! Views mount what they render into a [`RegionRegistry`]; the
//! [`ExportPipeline`] snapshots a region by handle, rasterizes it at a fixed
//! scale (with remote images fetched anonymously and inlined) and lays the
//! raster onto PDF pages.

pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod raster;
pub mod region;

pub use config::{ExportConfig, PageMode, RASTER_SCALE};
pub use error::{ExportError, ExportResult};
pub use pipeline::{artifact_file_name, ExportArtifact, ExportPipeline};
pub use raster::{HttpImageFetcher, ImageFetcher, Rasterizer, SvgRasterizer};
pub use region::{NodeKind, RecipeView, RegionHandle, RegionNode, RegionRegistry};
