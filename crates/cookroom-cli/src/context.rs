// Shared wiring for commands: configuration, backend, favorites, export

use std::sync::Arc;

use anyhow::Context;
use cookroom_api::{ApiConfig, HttpConfig, HttpRecipeBackend, RecipeBackend};
use cookroom_export::{ExportConfig, ExportPipeline, HttpImageFetcher, RegionRegistry};
use cookroom_images::{AttachmentManager, ImageConfig, PreviewRegistry};
use cookroom_sessions::{EventBus, FavoriteSync, Notice, RecipeSession, SessionConfig};
use tokio::sync::broadcast;

use crate::output::OutputStyle;

/// Everything a command needs, built once per invocation
pub struct AppContext {
    pub api: ApiConfig,
    pub images: ImageConfig,
    pub export: ExportConfig,
    pub sessions: SessionConfig,
    pub backend: Arc<dyn RecipeBackend>,
    pub favorites: Arc<FavoriteSync>,
    pub bus: EventBus,
}

impl AppContext {
    /// Load every config layer, then apply command-line overrides
    pub fn load(api_url: Option<&str>, token: Option<&str>) -> anyhow::Result<Self> {
        let mut api = ApiConfig::load_with_hierarchy().context("loading api config")?;
        if let Some(url) = api_url {
            api.base_url = url.to_string();
        }
        if let Some(token) = token {
            api.token = Some(token.to_string());
        }

        let images = ImageConfig::load_with_hierarchy().context("loading image config")?;
        let export = ExportConfig::load_with_hierarchy().context("loading export config")?;
        let sessions = SessionConfig::load_with_hierarchy().context("loading session config")?;
        Self::from_parts(api, images, export, sessions)
    }

    /// Build from explicit configuration
    pub fn from_parts(
        api: ApiConfig,
        images: ImageConfig,
        export: ExportConfig,
        sessions: SessionConfig,
    ) -> anyhow::Result<Self> {
        let backend = HttpRecipeBackend::shared(&api)
            .with_context(|| format!("connecting to {}", api.base_url))?;
        let bus = EventBus::with_capacity(sessions.notice_capacity);
        let favorites = FavoriteSync::new(Arc::clone(&backend))
            .with_bus(bus.clone())
            .shared();

        Ok(Self {
            api,
            images,
            export,
            sessions,
            backend,
            favorites,
            bus,
        })
    }

    /// Export pipeline fetching images without credentials
    pub fn pipeline(&self) -> anyhow::Result<ExportPipeline> {
        let fetcher = HttpImageFetcher::new(HttpConfig::fast()).context("building image fetcher")?;
        Ok(ExportPipeline::new(
            self.export.clone(),
            RegionRegistry::new(),
            Arc::new(fetcher),
        ))
    }

    /// A fresh analysis screen
    pub fn session(&self) -> anyhow::Result<RecipeSession> {
        let attachments = AttachmentManager::new(self.images.clone(), PreviewRegistry::new());
        Ok(RecipeSession::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.favorites),
            self.pipeline()?,
            self.api.clone(),
        )
        .with_attachments(attachments)
        .with_bus(self.bus.clone()))
    }
}

/// Print every notice published since `rx` subscribed
pub fn drain_notices(rx: &mut broadcast::Receiver<Notice>) {
    let style = OutputStyle::default();
    while let Ok(notice) = rx.try_recv() {
        eprintln!("{}", style.notice(&notice));
    }
}
