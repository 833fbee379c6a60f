//! Typed client for the Cooking Room recipe backend
//!
//! ## Features
//!
//! - **Trait-based contract**: `RecipeBackend` is mockable; `HttpRecipeBackend` talks HTTP
//! - **Normalized analysis**: flat recipe lists and wrapped objects land in one model
//! - **Configurable**: base URL, bearer token, timeouts, proxy, YAML + env hierarchy
//! - **Assets**: stored image paths and generated fallbacks resolve to URLs

pub mod assets;
pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use assets::{asset_url, fallback_image_url, resolve_recipe_image, ImageSource};
pub use backend::{HttpRecipeBackend, RecipeBackend};
pub use client::HttpClient;
pub use config::{ApiConfig, HttpConfig};
pub use error::{ApiError, ApiResult};
pub use models::{
    normalize_analysis, AnalysisOutcome, FavoriteEntry, HistoryEntry, ImageUpload, PageRequest,
    Recipe,
};
