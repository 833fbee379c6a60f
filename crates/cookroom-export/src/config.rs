//! Configuration for recipe export.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExportResult;

/// A4 width in points
pub const A4_WIDTH_PT: f32 = 595.28;
/// A4 height in points
pub const A4_HEIGHT_PT: f32 = 841.89;
/// Device pixels per layout pixel when rasterizing a region
pub const RASTER_SCALE: f32 = 2.0;

/// How the raster is laid onto pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageMode {
    /// One page whose height follows the raster's aspect ratio
    #[default]
    Continuous,
    /// Fixed-height pages with the raster sliced across them
    Paginated,
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Layout width of the region in CSS pixels
    pub content_width_px: f32,
    /// Tallest an inline image may be laid out, in CSS pixels
    pub max_image_height_px: f32,
    /// Page width in points
    pub page_width_pt: f32,
    /// Page height in points (paginated mode)
    pub page_height_pt: f32,
    pub page_mode: PageMode,
    /// JPEG quality for embedded page images (1-100)
    pub jpeg_quality: u8,
    /// Font families tried in order for rendered text
    pub font_family: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            content_width_px: 640.0,
            max_image_height_px: 360.0,
            page_width_pt: A4_WIDTH_PT,
            page_height_pt: A4_HEIGHT_PT,
            page_mode: PageMode::Continuous,
            jpeg_quality: 90,
            font_family: "Noto Sans, DejaVu Sans, Arial, sans-serif".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn with_page_mode(mut self, mode: PageMode) -> Self {
        self.page_mode = mode;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Load configuration from a YAML file, or defaults if the file doesn't exist.
    pub fn from_file(path: &Path) -> ExportResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load `export.yaml` from the user directory, then the project directory.
    pub fn load_with_hierarchy() -> ExportResult<Self> {
        let mut config = Self::default();

        if let Ok(user_home) = std::env::var("HOME") {
            let user_config_path = PathBuf::from(user_home)
                .join(".cookroom")
                .join("config")
                .join("export.yaml");
            if let Ok(user_config) = Self::from_file(&user_config_path) {
                config = user_config;
            }
        }

        let project_config_path = PathBuf::from("config/export.yaml");
        if project_config_path.exists() {
            config = Self::from_file(&project_config_path)?;
        }

        Ok(config)
    }
}
