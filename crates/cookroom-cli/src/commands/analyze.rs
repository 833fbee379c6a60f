// Analyze ingredient photos and print the suggested recipes

use std::{path::PathBuf, sync::Arc};

use cookroom_images::SelectedFile;
use cookroom_sessions::AnalysisState;
use tracing::debug;

use super::Command;
use crate::{
    context::{drain_notices, AppContext},
    error::{CliError, CliResult},
    output::{print_info, print_success, OutputStyle},
};

pub struct AnalyzeCommand {
    ctx: Arc<AppContext>,
    images: Vec<PathBuf>,
    prompt: Option<String>,
    export_dir: Option<PathBuf>,
}

impl AnalyzeCommand {
    pub fn new(ctx: Arc<AppContext>, images: Vec<PathBuf>) -> Self {
        Self {
            ctx,
            images,
            prompt: None,
            export_dir: None,
        }
    }

    pub fn with_prompt(mut self, prompt: Option<String>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Export every suggested recipe into `dir`
    pub fn with_export_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.export_dir = dir;
        self
    }
}

#[async_trait::async_trait]
impl Command for AnalyzeCommand {
    async fn execute(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let mut notices = self.ctx.bus.subscribe();
        let mut session = self.ctx.session()?;

        let files = self
            .images
            .iter()
            .map(|path| SelectedFile::from_path(path))
            .collect::<Result<Vec<_>, _>>()?;
        let attached = session.attach(files);
        drain_notices(&mut notices);
        let attached = attached?;
        debug!(admitted = attached.admitted.len(), "images attached");

        if let Some(prompt) = &self.prompt {
            session.set_prompt(prompt.clone());
        }
        if !session.can_submit() {
            return Err(CliError::InvalidArgument {
                message: "no usable images to analyze".to_string(),
            });
        }

        print_info(&format!("Analyzing {} image(s)...", session.attachments().len()));
        let state = session.submit().await;
        drain_notices(&mut notices);

        let outcome = match state {
            AnalysisState::Success(outcome) => outcome,
            AnalysisState::Failure(failure) => return Err(CliError::Analysis(failure.reason)),
            AnalysisState::Idle | AnalysisState::Pending => {
                return Err(CliError::Analysis("no result".to_string()))
            }
        };

        if !outcome.detected_ingredients.is_empty() {
            println!(
                "{}",
                style.key_value("Detected", &outcome.detected_ingredients.join(", "))
            );
        }
        if outcome.recipes.is_empty() {
            print_info("No recipes suggested");
        }
        for recipe in &outcome.recipes {
            println!("{}", style.recipe(recipe));
        }

        if let Some(dir) = &self.export_dir {
            for recipe in &outcome.recipes {
                let artifact = session.export_recipe(&recipe.name).await;
                drain_notices(&mut notices);
                let path = artifact?.save_to(dir)?;
                print_success(&format!("Saved {}", path.display()));
            }
        }

        session.teardown();
        Ok(())
    }
}
