//! HTTP transport shared by the backend client and image downloads

use reqwest::{Method, RequestBuilder, Response};
use tracing::debug;
use url::Url;

use crate::{
    config::HttpConfig,
    error::{ApiError, ApiResult},
};

/// Thin wrapper over `reqwest::Client` that turns error statuses into [`ApiError::Server`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpConfig,
}

impl HttpClient {
    /// Create a new HTTP client with configuration
    pub fn new(config: HttpConfig) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(&config.user_agent)
            .pool_idle_timeout(config.pool_idle_timeout());

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| ApiError::Build(format!("invalid proxy {proxy_url}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let inner = builder.build().map_err(|e| ApiError::Build(e.to_string()))?;

        Ok(Self { inner, config })
    }

    /// Create HTTP client with default configuration
    pub fn with_defaults() -> ApiResult<Self> {
        Self::new(HttpConfig::default())
    }

    /// Get configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Start a request
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("HTTP {} {}", method, url);
        self.inner.request(method, url)
    }

    /// Send a request, mapping non-2xx statuses to [`ApiError::Server`]
    pub async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(ApiError::Transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Server {
            status: Some(status.as_u16()),
            message: error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string()),
        })
    }

    /// Download a resource without credentials
    pub async fn get_bytes(&self, url: &str) -> ApiResult<Vec<u8>> {
        let url = url
            .parse::<Url>()
            .map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))?;

        let response = self.send(self.request(Method::GET, url)).await?;
        let bytes = response.bytes().await.map_err(ApiError::Transport)?;
        Ok(bytes.to_vec())
    }
}

/// Extract a human-readable reason from an error body.
///
/// Understands `{ "error": .. }` and FastAPI's `{ "detail": .. }`, falling back to
/// the raw text when it is short enough to show.
pub fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["error", "detail", "message"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) => return Some(s.clone()),
                Some(other) if !other.is_null() => return Some(other.to_string()),
                _ => {}
            }
        }
    }

    if trimmed.len() <= 200 {
        Some(trimmed.to_string())
    } else {
        None
    }
}
