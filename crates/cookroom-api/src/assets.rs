//! Resolution of recipe and history images to fetchable URLs.

use url::Url;

use crate::{
    config::ApiConfig,
    error::{ApiError, ApiResult},
    models::Recipe,
};

/// Storage prefix the backend records in paths but doesn't serve under
const STORAGE_PREFIX: &str = "backend/";

/// Where a recipe picture comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Stored on the backend
    Backend(String),
    /// Generated/searched externally from the recipe name
    Generated(String),
}

impl ImageSource {
    pub fn url(&self) -> &str {
        match self {
            ImageSource::Backend(url) | ImageSource::Generated(url) => url,
        }
    }
}

/// Resolve a stored asset path against the backend origin.
///
/// Absolute `http(s)` URLs pass through untouched.
pub fn asset_url(base_url: &str, image_path: &str) -> ApiResult<String> {
    let path = image_path.trim();
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(path.to_string());
    }

    let relative = path.trim_start_matches('/');
    let relative = relative.strip_prefix(STORAGE_PREFIX).unwrap_or(relative);

    let base = with_trailing_slash(base_url)?;
    base.join(relative)
        .map(String::from)
        .map_err(|e| ApiError::InvalidUrl(format!("{image_path}: {e}")))
}

/// External image URL built from the recipe's English or native name
pub fn fallback_image_url(template: &str, recipe: &Recipe) -> String {
    let query = urlencoding::encode(recipe.search_term());
    template.replace("{query}", &query)
}

/// Pick the image source for a recipe: stored image first, generated fallback otherwise
pub fn resolve_recipe_image(config: &ApiConfig, recipe: &Recipe) -> ImageSource {
    recipe
        .image_path
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .and_then(|p| asset_url(&config.base_url, p).ok())
        .map(ImageSource::Backend)
        .unwrap_or_else(|| {
            ImageSource::Generated(fallback_image_url(&config.fallback_image_template, recipe))
        })
}

pub(crate) fn with_trailing_slash(base_url: &str) -> ApiResult<Url> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))
}
