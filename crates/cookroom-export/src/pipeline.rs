//! On-demand export of a mounted recipe region to a PDF artifact.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use cookroom_api::Recipe;
use tracing::{debug, info, warn};

use crate::{
    config::{ExportConfig, RASTER_SCALE},
    document::compose,
    error::{ExportError, ExportResult},
    layout::{Block, LayoutOptions},
    raster::{decode_data_uri, inline_image, ImageFetcher, Rasterizer, SvgRasterizer},
    region::{NodeKind, RegionHandle, RegionNode, RegionRegistry},
};

/// Finished export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl ExportArtifact {
    /// Write the document into `dir`, creating it if needed.
    pub fn save_to(&self, dir: &Path) -> ExportResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), bytes = self.bytes.len(), "saved export");
        Ok(path)
    }
}

/// `<recipe name>.pdf` with path separators, reserved and control characters replaced
pub fn artifact_file_name(recipe_name: &str) -> String {
    let cleaned: String = recipe_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').trim();
    if cleaned.is_empty() {
        "recipe.pdf".to_string()
    } else {
        format!("{cleaned}.pdf")
    }
}

/// Snapshots a mounted region, rasterizes it and assembles one PDF.
///
/// A failed export leaves the registry untouched.
#[derive(Clone)]
pub struct ExportPipeline {
    config: ExportConfig,
    registry: RegionRegistry,
    fetcher: Arc<dyn ImageFetcher>,
    rasterizer: Arc<dyn Rasterizer>,
}

impl ExportPipeline {
    /// Pipeline rendering with system fonts
    pub fn new(config: ExportConfig, registry: RegionRegistry, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self::with_rasterizer(config, registry, fetcher, Arc::new(SvgRasterizer::new()))
    }

    pub fn with_rasterizer(
        config: ExportConfig,
        registry: RegionRegistry,
        fetcher: Arc<dyn ImageFetcher>,
        rasterizer: Arc<dyn Rasterizer>,
    ) -> Self {
        Self {
            config,
            registry,
            fetcher,
            rasterizer,
        }
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export the region behind `handle`, naming the file after `recipe`.
    pub async fn export(&self, handle: RegionHandle, recipe: &Recipe) -> ExportResult<ExportArtifact> {
        let nodes = self.registry.snapshot(handle)?;
        debug!(%handle, nodes = nodes.len(), "exporting region");

        let blocks = self.resolve(nodes).await;
        let options = LayoutOptions {
            width: self.config.content_width_px,
            max_image_height: self.config.max_image_height_px,
            font_family: self.config.font_family.clone(),
            ..Default::default()
        };

        let rasterizer = Arc::clone(&self.rasterizer);
        let config = self.config.clone();
        let title = recipe.name.clone();
        let document = tokio::task::spawn_blocking(move || {
            let raster = rasterizer.rasterize(&blocks, &options, RASTER_SCALE)?;
            compose(&raster, &title, &config)
        })
        .await
        .map_err(|e| ExportError::ExportFailed(format!("render task failed: {e}")))?
        .map_err(|e| match e {
            ExportError::ExportFailed(_) => e,
            other => ExportError::ExportFailed(other.to_string()),
        })?;

        let artifact = ExportArtifact {
            file_name: artifact_file_name(&recipe.name),
            bytes: document.bytes,
            page_count: document.page_count,
        };
        info!(
            file = %artifact.file_name,
            pages = artifact.page_count,
            "exported recipe"
        );
        Ok(artifact)
    }

    /// Drop excluded nodes and inline images; images that can't be fetched are left out.
    async fn resolve(&self, nodes: Vec<RegionNode>) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(nodes.len());
        for node in nodes.into_iter().filter(|n| !n.exclude_from_export) {
            let block = match node.kind {
                NodeKind::Heading(text) => Block::Heading(text),
                NodeKind::Subheading(text) => Block::Subheading(text),
                NodeKind::Paragraph(text) => Block::Paragraph(text),
                NodeKind::List { ordered, items } => Block::List { ordered, items },
                NodeKind::Control(label) => Block::Control(label),
                NodeKind::Image { url, .. } => match self.load_image(&url).await {
                    Ok(image) => image,
                    Err(e) => {
                        warn!(%url, error = %e, "leaving image out of export");
                        continue;
                    }
                },
            };
            blocks.push(block);
        }
        blocks
    }

    async fn load_image(&self, url: &str) -> ExportResult<Block> {
        let bytes = match decode_data_uri(url) {
            Some(decoded) => decoded?,
            None => self.fetcher.fetch(url).await?,
        };
        Ok(Block::Image(inline_image(&bytes)?))
    }
}
