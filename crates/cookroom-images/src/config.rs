//! Configuration for image attachments.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ImageResult;

/// Default attachment cap per session
pub const DEFAULT_MAX_ATTACHMENTS: usize = 3;

/// Image attachment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Maximum number of live attachments
    pub max_attachments: usize,
    /// Maximum size of one image in MB
    pub max_file_size_mb: u64,
    /// Supported image formats
    pub formats: FormatsConfig,
}

/// Supported image formats configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatsConfig {
    /// List of supported formats (e.g., "png", "jpg", "gif", "webp")
    pub supported: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_attachments: DEFAULT_MAX_ATTACHMENTS,
            max_file_size_mb: 10,
            formats: FormatsConfig::default(),
        }
    }
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            supported: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "webp".to_string(),
            ],
        }
    }
}

impl ImageConfig {
    pub fn with_max_attachments(mut self, max: usize) -> Self {
        self.max_attachments = max;
        self
    }

    pub fn with_max_file_size_mb(mut self, max_mb: u64) -> Self {
        self.max_file_size_mb = max_mb;
        self
    }

    /// Maximum file size in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Load configuration from a YAML file, or defaults if the file doesn't exist.
    pub fn from_file(path: &Path) -> ImageResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with hierarchy support.
    ///
    /// Configuration hierarchy (highest to lowest priority):
    /// 1. Project-level config (config/images.yaml)
    /// 2. User-level config (~/.cookroom/config/images.yaml)
    /// 3. Built-in defaults
    pub fn load_with_hierarchy() -> ImageResult<Self> {
        let mut config = Self::default();

        if let Ok(user_home) = std::env::var("HOME") {
            let user_config_path = PathBuf::from(user_home)
                .join(".cookroom")
                .join("config")
                .join("images.yaml");
            if let Ok(user_config) = Self::from_file(&user_config_path) {
                config = Self::merge(config, user_config);
            }
        }

        let project_config_path = PathBuf::from("config/images.yaml");
        if let Ok(project_config) = Self::from_file(&project_config_path) {
            config = Self::merge(config, project_config);
        }

        Ok(config)
    }

    /// Merge two configurations, with `override_config` taking precedence.
    fn merge(mut base: Self, override_config: Self) -> Self {
        if override_config.max_attachments != 0 {
            base.max_attachments = override_config.max_attachments;
        }
        if override_config.max_file_size_mb != 0 {
            base.max_file_size_mb = override_config.max_file_size_mb;
        }
        if !override_config.formats.supported.is_empty() {
            base.formats = override_config.formats;
        }
        base
    }

    /// Check if a format is supported.
    pub fn is_format_supported(&self, format: &str) -> bool {
        self.formats
            .supported
            .iter()
            .any(|f| f.eq_ignore_ascii_case(format))
    }

    /// Get the list of supported formats as a comma-separated string.
    pub fn supported_formats_string(&self) -> String {
        self.formats.supported.join(", ")
    }
}
