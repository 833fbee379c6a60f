// Export a saved recipe to PDF

use std::{path::PathBuf, sync::Arc};

use cookroom_api::Recipe;
use cookroom_sessions::{FavoritesList, HistoryList};

use super::{favorites::find_favorite, history::find_history, Command};
use crate::{
    context::{drain_notices, AppContext},
    error::{CliError, CliResult},
    output::print_success,
};

/// Where the recipe to export comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSource {
    Favorite { id: i64 },
    /// A history entry; the first recipe unless `recipe` names one
    History { id: i64, recipe: Option<String> },
}

pub struct ExportCommand {
    ctx: Arc<AppContext>,
    source: ExportSource,
    out_dir: PathBuf,
}

impl ExportCommand {
    pub fn new(ctx: Arc<AppContext>, source: ExportSource, out_dir: PathBuf) -> Self {
        Self {
            ctx,
            source,
            out_dir,
        }
    }

    async fn resolve(&self) -> CliResult<Recipe> {
        let ctx = &self.ctx;
        match &self.source {
            ExportSource::Favorite { id } => {
                let list = FavoritesList::new(
                    Arc::clone(&ctx.backend),
                    Arc::clone(&ctx.favorites),
                    ctx.sessions.favorites_page_size,
                    ctx.bus.clone(),
                );
                find_favorite(&list, *id)
                    .await?
                    .map(|entry| entry.recipe_data)
                    .ok_or_else(|| CliError::NotFound(format!("favorite #{id}")))
            }
            ExportSource::History { id, recipe } => {
                let list = HistoryList::new(
                    Arc::clone(&ctx.backend),
                    ctx.sessions.history_page_size,
                    ctx.bus.clone(),
                );
                let entry = find_history(&list, *id)
                    .await?
                    .ok_or_else(|| CliError::NotFound(format!("history entry #{id}")))?;
                let recipes = entry.recipes();
                let found = match recipe {
                    Some(name) => recipes.into_iter().find(|r| &r.name == name),
                    None => recipes.into_iter().next(),
                };
                found.ok_or_else(|| {
                    CliError::NotFound(match recipe {
                        Some(name) => format!("recipe '{name}' in history entry #{id}"),
                        None => format!("recipes in history entry #{id}"),
                    })
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl Command for ExportCommand {
    async fn execute(&self) -> CliResult<()> {
        let mut notices = self.ctx.bus.subscribe();
        let recipe = self.resolve().await?;

        let session = self.ctx.session()?;
        let artifact = session.export_saved(&recipe).await;
        drain_notices(&mut notices);

        let artifact = artifact?;
        let path = artifact.save_to(&self.out_dir)?;
        print_success(&format!(
            "Saved {} ({} page(s))",
            path.display(),
            artifact.page_count
        ));
        Ok(())
    }
}
