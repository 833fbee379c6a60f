//! Backend client configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;

/// Environment variable overriding [`ApiConfig::base_url`]
pub const ENV_BASE_URL: &str = "COOKROOM_API_URL";
/// Environment variable overriding [`ApiConfig::token`]
pub const ENV_TOKEN: &str = "COOKROOM_API_TOKEN";

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds (analysis calls can be slow)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// HTTP/HTTPS proxy URL
    #[serde(default)]
    pub proxy: Option<String>,

    /// Custom user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pool idle timeout in seconds
    #[serde(default = "default_pool_idle_secs")]
    pub pool_idle_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            proxy: None,
            user_agent: default_user_agent(),
            pool_idle_secs: default_pool_idle_secs(),
        }
    }
}

impl HttpConfig {
    /// Config for short calls such as image downloads (10s timeout)
    pub fn fast() -> Self {
        Self {
            timeout_secs: 10,
            connect_timeout_secs: 5,
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_secs)
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Set proxy URL
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Recipe backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend origin; asset paths resolve against it too
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every backend call
    #[serde(default)]
    pub token: Option<String>,

    /// Transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// URL template used when a recipe has no stored image; `{query}` is replaced
    #[serde(default = "default_fallback_image_template")]
    pub fallback_image_template: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            http: HttpConfig::default(),
            fallback_image_template: default_fallback_image_template(),
        }
    }
}

impl ApiConfig {
    /// Create a config pointing at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set transport settings
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Load configuration from a YAML file, or defaults if it doesn't exist
    pub fn from_file(path: &Path) -> ApiResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with hierarchy support.
    ///
    /// Highest priority first:
    /// 1. Environment (`COOKROOM_API_URL`, `COOKROOM_API_TOKEN`)
    /// 2. Project-level config (`config/api.yaml`)
    /// 3. User-level config (`~/.cookroom/config/api.yaml`)
    /// 4. Built-in defaults
    pub fn load_with_hierarchy() -> ApiResult<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_path = home.join(".cookroom").join("config").join("api.yaml");
            config = Self::merge(config, Self::from_file(&user_path)?);
        }

        let project_path = PathBuf::from("config").join("api.yaml");
        config = Self::merge(config, Self::from_file(&project_path)?);

        config.apply_env();
        debug!(base_url = %config.base_url, "loaded api config");
        Ok(config)
    }

    /// Apply environment overrides in place
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            if !token.trim().is_empty() {
                self.token = Some(token);
            }
        }
    }

    /// Merge two configurations, with non-default `override_config` values winning
    fn merge(mut base: Self, override_config: Self) -> Self {
        let defaults = Self::default();

        if override_config.base_url != defaults.base_url {
            base.base_url = override_config.base_url;
        }
        if override_config.token.is_some() {
            base.token = override_config.token;
        }
        if override_config.http != defaults.http {
            base.http = override_config.http;
        }
        if override_config.fallback_image_template != defaults.fallback_image_template {
            base.fallback_image_template = override_config.fallback_image_template;
        }

        base
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("CookingRoom/{}", env!("CARGO_PKG_VERSION"))
}

fn default_pool_idle_secs() -> u64 {
    90
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_fallback_image_template() -> String {
    "https://image.pollinations.ai/prompt/{query}".to_string()
}
