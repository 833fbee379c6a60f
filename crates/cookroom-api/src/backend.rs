//! The recipe backend contract and its HTTP implementation

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Method, RequestBuilder,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::{
    assets::with_trailing_slash,
    client::HttpClient,
    config::ApiConfig,
    error::{ApiError, ApiResult},
    models::{
        normalize_analysis, AnalysisOutcome, FavoriteCreate, FavoriteEntry, HistoryEntry,
        ImageUpload, PageRequest, Recipe,
    },
};

/// Multipart field carrying each image, repeated once per part
pub const IMAGE_FIELD: &str = "file";
/// Multipart field carrying the prompt text
pub const PROMPT_FIELD: &str = "prompt";

/// Mockable backend contract consumed by the session controller
#[async_trait]
pub trait RecipeBackend: Send + Sync {
    /// Submit images and prompt, receive normalized recipes
    async fn analyze(&self, images: &[ImageUpload], prompt: &str) -> ApiResult<AnalysisOutcome>;

    /// Save a recipe as favorite
    async fn add_favorite(&self, recipe: &Recipe) -> ApiResult<FavoriteEntry>;

    /// Remove a favorite by recipe name
    async fn remove_favorite_by_name(&self, name: &str) -> ApiResult<()>;

    /// Remove a favorite by record id
    async fn remove_favorite_by_id(&self, id: i64) -> ApiResult<()>;

    /// One page of favorites
    async fn list_favorites(&self, page: PageRequest) -> ApiResult<Vec<FavoriteEntry>>;

    /// One page of history
    async fn list_history(&self, page: PageRequest) -> ApiResult<Vec<HistoryEntry>>;

    /// Delete a history entry
    async fn delete_history(&self, id: i64) -> ApiResult<()>;
}

/// Backend reached over HTTP with optional bearer authentication
#[derive(Debug, Clone)]
pub struct HttpRecipeBackend {
    http: HttpClient,
    base: Url,
    token: Option<String>,
}

impl HttpRecipeBackend {
    /// Create a backend client from configuration
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        Ok(Self {
            http: HttpClient::new(config.http.clone())?,
            base: with_trailing_slash(&config.base_url)?,
            token: config.token.clone(),
        })
    }

    /// Arc-wrapped trait object for sharing across controllers
    pub fn shared(config: &ApiConfig) -> ApiResult<Arc<dyn RecipeBackend>> {
        Ok(Arc::new(Self::new(config)?))
    }

    /// Backend origin
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    fn authorized(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let request = self.http.request(method, self.endpoint(path)?);
        Ok(match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.http.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn fetch_page<T: DeserializeOwned>(&self, path: &str, page: PageRequest) -> ApiResult<Vec<T>> {
        let request = self
            .authorized(Method::GET, path)?
            .query(&[("skip", page.skip()), ("limit", page.limit())]);
        self.fetch_json(request).await
    }
}

#[async_trait]
impl RecipeBackend for HttpRecipeBackend {
    async fn analyze(&self, images: &[ImageUpload], prompt: &str) -> ApiResult<AnalysisOutcome> {
        let mut form = Form::new().text(PROMPT_FIELD, prompt.to_string());
        for image in images {
            let part = Part::bytes(image.bytes.to_vec())
                .file_name(image.file_name.clone())
                .mime_str(&image.mime)
                .map_err(|e| ApiError::InvalidRequest(format!("{}: {e}", image.file_name)))?;
            form = form.part(IMAGE_FIELD, part);
        }

        info!(images = images.len(), "submitting analysis request");
        let request = self.authorized(Method::POST, "analyze")?.multipart(form);
        let body: Value = self.fetch_json(request).await?;

        normalize_analysis(body).map_err(|message| ApiError::Server {
            status: None,
            message,
        })
    }

    async fn add_favorite(&self, recipe: &Recipe) -> ApiResult<FavoriteEntry> {
        debug!(name = %recipe.name, "adding favorite");
        let request = self
            .authorized(Method::POST, "favorites")?
            .json(&FavoriteCreate { recipe_data: recipe });
        self.fetch_json(request).await
    }

    async fn remove_favorite_by_name(&self, name: &str) -> ApiResult<()> {
        debug!(%name, "removing favorite by name");
        let path = format!("favorites/{}", urlencoding::encode(name));
        self.http.send(self.authorized(Method::DELETE, &path)?).await?;
        Ok(())
    }

    async fn remove_favorite_by_id(&self, id: i64) -> ApiResult<()> {
        debug!(id, "removing favorite by id");
        let path = format!("favorites/id/{id}");
        self.http.send(self.authorized(Method::DELETE, &path)?).await?;
        Ok(())
    }

    async fn list_favorites(&self, page: PageRequest) -> ApiResult<Vec<FavoriteEntry>> {
        self.fetch_page("favorites", page).await
    }

    async fn list_history(&self, page: PageRequest) -> ApiResult<Vec<HistoryEntry>> {
        self.fetch_page("history", page).await
    }

    async fn delete_history(&self, id: i64) -> ApiResult<()> {
        debug!(id, "deleting history entry");
        let path = format!("history/{id}");
        self.http.send(self.authorized(Method::DELETE, &path)?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_relative_paths() {
        let backend = HttpRecipeBackend::new(&ApiConfig::new("http://localhost:8000/api")).unwrap();
        assert_eq!(
            backend.endpoint("favorites/id/3").unwrap().as_str(),
            "http://localhost:8000/api/favorites/id/3"
        );
    }

    #[test]
    fn test_endpoint_keeps_encoded_names() {
        let backend = HttpRecipeBackend::new(&ApiConfig::default()).unwrap();
        let path = format!("favorites/{}", urlencoding::encode("Mac & Cheese/Deluxe"));
        assert_eq!(
            backend.endpoint(&path).unwrap().path(),
            "/favorites/Mac%20%26%20Cheese%2FDeluxe"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = HttpRecipeBackend::new(&ApiConfig::new("::not-a-url::"));
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }
}
