//! Per-screen recipe session.
//!
//! [`RecipeSession`] owns what the analysis screen edits (attachments, the
//! prompt, dictation, the analysis result) and shares the favorite cache and
//! export pipeline with the rest of the application. Each recipe of a
//! successful result is mounted as an export region so the same card the user
//! sees can be exported by handle.

use std::sync::Arc;

use cookroom_api::{resolve_recipe_image, ApiConfig, Recipe, RecipeBackend};
use cookroom_export::{ExportArtifact, ExportPipeline, RecipeView, RegionHandle};
use cookroom_images::{AddOutcome, AttachmentId, AttachmentManager, ImageError, SelectedFile};
use tracing::{debug, info, warn};

use crate::{
    analysis::{AnalysisSession, AnalysisState, FailureKind},
    bus::{EventBus, Notice, NoticeTopic},
    dictation::{DictationBridge, DictationOutcome, DictationStart},
    error::{SessionError, SessionResult},
    favorites::{FavoriteSync, ToggleOutcome},
    prompt::PromptText,
};

pub struct RecipeSession {
    attachments: AttachmentManager,
    prompt: PromptText,
    dictation: DictationBridge,
    analysis: AnalysisSession,
    favorites: Arc<FavoriteSync>,
    export: ExportPipeline,
    api: ApiConfig,
    bus: EventBus,
    /// Result regions in recipe order
    regions: Vec<(String, RegionHandle)>,
}

impl std::fmt::Debug for RecipeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeSession")
            .field("attachments", &self.attachments.len())
            .field("prompt", &self.prompt)
            .field("dictation", &self.dictation)
            .field("analysis", &self.analysis)
            .field("regions", &self.regions.len())
            .finish()
    }
}

impl RecipeSession {
    pub fn new(
        backend: Arc<dyn RecipeBackend>,
        favorites: Arc<FavoriteSync>,
        export: ExportPipeline,
        api: ApiConfig,
    ) -> Self {
        Self {
            attachments: AttachmentManager::with_defaults(),
            prompt: PromptText::default(),
            dictation: DictationBridge::unsupported(),
            analysis: AnalysisSession::new(backend),
            favorites,
            export,
            api,
            bus: EventBus::new(),
            regions: Vec::new(),
        }
    }

    pub fn with_attachments(mut self, attachments: AttachmentManager) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_dictation(mut self, dictation: DictationBridge) -> Self {
        self.dictation = dictation;
        self
    }

    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // Attachments

    /// Add picked or dropped files. Over the cap, nothing is added.
    pub fn attach(&mut self, files: impl IntoIterator<Item = SelectedFile>) -> SessionResult<AddOutcome> {
        match self.attachments.add(files) {
            Ok(outcome) => {
                for skipped in &outcome.skipped {
                    self.bus.publish(Notice::warning(
                        NoticeTopic::Attachments,
                        format!("Skipped {}: {}", skipped.name, skipped.reason),
                    ));
                }
                Ok(outcome)
            }
            Err(err) => {
                if let ImageError::LimitExceeded { max, .. } = &err {
                    self.bus.publish(Notice::warning(
                        NoticeTopic::Attachments,
                        format!("You can attach at most {max} images"),
                    ));
                }
                Err(err.into())
            }
        }
    }

    pub fn remove_attachment(&mut self, id: AttachmentId) -> bool {
        self.attachments.remove(id)
    }

    pub fn attachments(&self) -> &AttachmentManager {
        &self.attachments
    }

    // Prompt and dictation

    pub fn prompt(&self) -> &PromptText {
        &self.prompt
    }

    pub fn set_prompt(&mut self, text: impl Into<String>) {
        self.prompt.set(text);
    }

    pub fn dictation(&self) -> &DictationBridge {
        &self.dictation
    }

    /// Press the microphone control
    pub fn toggle_dictation(&mut self) -> SessionResult<DictationStart> {
        self.dictation.start().map_err(|err| {
            self.bus.publish(Notice::error(NoticeTopic::Dictation, err.to_string()));
            err.into()
        })
    }

    /// Apply the next recognizer event to the prompt. `None` when not listening.
    pub async fn pump_dictation(&mut self) -> Option<DictationOutcome> {
        let outcome = self.dictation.pump(&mut self.prompt).await?;
        if let DictationOutcome::Failed(err) = &outcome {
            self.bus.publish(Notice::error(NoticeTopic::Dictation, err.to_string()));
        }
        Some(outcome)
    }

    // Analysis

    pub fn can_submit(&self) -> bool {
        !self.attachments.is_empty() && !self.analysis.is_pending()
    }

    /// Send the attachments and prompt for analysis.
    ///
    /// On success the attachments are cleared and each recipe is mounted as an
    /// export region. Failures are published and leave the attachments in
    /// place for another try.
    pub async fn submit(&mut self) -> AnalysisState {
        let uploads = self.attachments.uploads();
        let state = self.analysis.submit(&uploads, self.prompt.as_str()).await;

        match &state {
            AnalysisState::Success(outcome) => {
                let cleared = self.attachments.clear();
                debug!(cleared, "attachments cleared after analysis");
                self.mount_results(&outcome.recipes);
            }
            AnalysisState::Failure(failure) => {
                let notice = match failure.kind {
                    FailureKind::NoInput => Notice::warning(NoticeTopic::Analysis, &failure.reason),
                    _ => Notice::error(NoticeTopic::Analysis, &failure.reason),
                };
                self.bus.publish(notice);
            }
            AnalysisState::Idle | AnalysisState::Pending => {}
        }
        state
    }

    pub fn analysis_state(&self) -> AnalysisState {
        self.analysis.current()
    }

    pub fn recipes(&self) -> Vec<Recipe> {
        self.analysis.recipes()
    }

    fn card(&self, recipe: &Recipe) -> Vec<cookroom_export::RegionNode> {
        RecipeView::new(recipe)
            .with_image(resolve_recipe_image(&self.api, recipe).url())
            .with_favorite(self.favorites.is_favorite(&recipe.name))
            .nodes()
    }

    fn mount_results(&mut self, recipes: &[Recipe]) {
        self.unmount_results();
        for recipe in recipes {
            let handle = self.export.registry().mount(self.card(recipe));
            self.regions.push((recipe.name.clone(), handle));
        }
        debug!(regions = self.regions.len(), "result regions mounted");
    }

    fn unmount_results(&mut self) {
        for (_, handle) in self.regions.drain(..) {
            self.export.registry().unmount(handle);
        }
    }

    /// Region showing the named recipe of the current result
    pub fn region_for(&self, name: &str) -> Option<RegionHandle> {
        self.regions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, handle)| *handle)
    }

    // Favorites

    pub fn is_favorite(&self, name: &str) -> bool {
        self.favorites.is_favorite(name)
    }

    /// Toggle the named recipe of the current result
    pub async fn toggle_favorite(&self, name: &str) -> SessionResult<ToggleOutcome> {
        let recipe = self
            .analysis
            .recipe(name)
            .ok_or_else(|| SessionError::RecipeNotFound(name.to_string()))?;

        let outcome = self.favorites.toggle(&recipe).await?;
        if outcome != ToggleOutcome::Ignored {
            if let Some(handle) = self.region_for(name) {
                if let Err(err) = self.export.registry().update(handle, self.card(&recipe)) {
                    warn!(%name, error = %err, "region vanished before update");
                }
            }
        }
        Ok(outcome)
    }

    // Export

    /// Export the named recipe of the current result
    pub async fn export_recipe(&self, name: &str) -> SessionResult<ExportArtifact> {
        let recipe = self
            .analysis
            .recipe(name)
            .ok_or_else(|| SessionError::RecipeNotFound(name.to_string()))?;
        let handle = self
            .region_for(name)
            .ok_or_else(|| SessionError::RecipeNotFound(name.to_string()))?;
        self.export_region(handle, &recipe).await
    }

    /// Export a recipe opened from history or favorites
    pub async fn export_saved(&self, recipe: &Recipe) -> SessionResult<ExportArtifact> {
        let handle = self.export.registry().mount(self.card(recipe));
        let result = self.export_region(handle, recipe).await;
        self.export.registry().unmount(handle);
        result
    }

    async fn export_region(&self, handle: RegionHandle, recipe: &Recipe) -> SessionResult<ExportArtifact> {
        match self.export.export(handle, recipe).await {
            Ok(artifact) => {
                self.bus.publish(Notice::info(
                    NoticeTopic::Export,
                    format!("Exported {}", artifact.file_name),
                ));
                Ok(artifact)
            }
            Err(err) => {
                warn!(recipe = %recipe.name, error = %err, "export failed");
                self.bus.publish(Notice::error(NoticeTopic::Export, err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Release attachment previews, stop dictation and unmount result regions.
    /// Safe to call more than once.
    pub fn teardown(&mut self) {
        self.attachments.teardown();
        self.dictation.stop();
        self.unmount_results();
        info!("recipe session torn down");
    }
}

impl Drop for RecipeSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
