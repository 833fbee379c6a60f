// Browse and prune saved recipes

use std::sync::Arc;

use cookroom_api::FavoriteEntry;
use cookroom_sessions::FavoritesList;

use super::Command;
use crate::{
    context::{drain_notices, AppContext},
    error::{CliError, CliResult},
    output::{print_info, print_success, OutputStyle},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesAction {
    List { pages: usize },
    Show { id: i64 },
    Delete { id: i64 },
}

pub struct FavoritesCommand {
    ctx: Arc<AppContext>,
    action: FavoritesAction,
}

impl FavoritesCommand {
    pub fn new(ctx: Arc<AppContext>, action: FavoritesAction) -> Self {
        Self { ctx, action }
    }

    fn list(&self) -> FavoritesList {
        FavoritesList::new(
            Arc::clone(&self.ctx.backend),
            Arc::clone(&self.ctx.favorites),
            self.ctx.sessions.favorites_page_size,
            self.ctx.bus.clone(),
        )
    }
}

/// Page through favorites until `id` is loaded or the feed runs out
pub async fn find_favorite(list: &FavoritesList, id: i64) -> CliResult<Option<FavoriteEntry>> {
    loop {
        if let Some(entry) = list.feed().get(&id) {
            return Ok(Some(entry));
        }
        if list.feed().is_exhausted() {
            return Ok(None);
        }
        list.load_more().await?;
    }
}

#[async_trait::async_trait]
impl Command for FavoritesCommand {
    async fn execute(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let mut notices = self.ctx.bus.subscribe();
        let list = self.list();

        let result = match &self.action {
            FavoritesAction::List { pages } => {
                for _ in 0..(*pages).max(1) {
                    if list.feed().is_exhausted() {
                        break;
                    }
                    list.load_more().await?;
                }
                println!("{}", style.section("Favorites"));
                for entry in list.entries() {
                    println!("{}", style.favorite_line(&entry));
                }
                if list.entries().is_empty() {
                    print_info("No favorites yet");
                } else if !list.feed().is_exhausted() {
                    print_info("More favorites available; pass --pages to load more");
                }
                Ok(())
            }
            FavoritesAction::Show { id } => {
                let entry = find_favorite(&list, *id)
                    .await?
                    .ok_or_else(|| CliError::NotFound(format!("favorite #{id}")))?;
                println!("{}", style.recipe(&entry.recipe_data));
                Ok(())
            }
            FavoritesAction::Delete { id } => {
                list.delete(*id).await?;
                print_success(&format!("Removed favorite #{id}"));
                Ok(())
            }
        };

        drain_notices(&mut notices);
        result
    }
}
