//! Session configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SessionResult;

/// Tunables for the recipe session and list screens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Items per favorites page
    pub favorites_page_size: usize,
    /// Items per history page
    pub history_page_size: usize,
    /// Distance from the end of a list, in pixels, that triggers the next page
    pub scroll_threshold_px: f32,
    /// Recognition language passed to the speech recognizer
    pub dictation_language: String,
    /// Buffered notices per subscriber
    pub notice_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            favorites_page_size: 12,
            history_page_size: 12,
            scroll_threshold_px: 200.0,
            dictation_language: "en-US".to_string(),
            notice_capacity: 1024,
        }
    }
}

impl SessionConfig {
    pub fn with_page_sizes(mut self, favorites: usize, history: usize) -> Self {
        self.favorites_page_size = favorites;
        self.history_page_size = history;
        self
    }

    pub fn with_dictation_language(mut self, language: impl Into<String>) -> Self {
        self.dictation_language = language.into();
        self
    }

    /// Load from a YAML file, or defaults if it doesn't exist
    pub fn from_file(path: &Path) -> SessionResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// `~/.cookroom/config/sessions.yaml`, overridden by `config/sessions.yaml`
    pub fn load_with_hierarchy() -> SessionResult<Self> {
        let mut config = Self::default();

        if let Some(home) = std::env::var_os("HOME") {
            let user_path = PathBuf::from(home)
                .join(".cookroom")
                .join("config")
                .join("sessions.yaml");
            if let Ok(user_config) = Self::from_file(&user_path) {
                config = user_config;
            }
        }

        let project_path = PathBuf::from("config/sessions.yaml");
        if project_path.exists() {
            config = Self::from_file(&project_path)?;
        }

        Ok(config)
    }
}
