// Browse and prune past analyses

use std::sync::Arc;

use cookroom_api::HistoryEntry;
use cookroom_sessions::HistoryList;

use super::Command;
use crate::{
    context::{drain_notices, AppContext},
    error::{CliError, CliResult},
    output::{print_info, print_success, OutputStyle},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    /// Print up to `pages` pages
    List { pages: usize },
    /// Print the recipes of one entry
    Show { id: i64 },
    Delete { id: i64 },
}

pub struct HistoryCommand {
    ctx: Arc<AppContext>,
    action: HistoryAction,
}

impl HistoryCommand {
    pub fn new(ctx: Arc<AppContext>, action: HistoryAction) -> Self {
        Self { ctx, action }
    }

    fn list(&self) -> HistoryList {
        HistoryList::new(
            Arc::clone(&self.ctx.backend),
            self.ctx.sessions.history_page_size,
            self.ctx.bus.clone(),
        )
    }
}

/// Page through history until `id` is loaded or the feed runs out
pub async fn find_history(list: &HistoryList, id: i64) -> CliResult<Option<HistoryEntry>> {
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
impl Command for HistoryCommand {
    async fn execute(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let mut notices = self.ctx.bus.subscribe();
        let list = self.list();

        let result = match &self.action {
            HistoryAction::List { pages } => {
                for _ in 0..(*pages).max(1) {
                    if list.feed().is_exhausted() {
                        break;
                    }
                    list.load_more().await?;
                }
                println!("{}", style.section("History"));
                for entry in list.entries() {
                    println!("{}", style.history_line(&entry));
                }
                if list.entries().is_empty() {
                    print_info("No history yet");
                } else if !list.feed().is_exhausted() {
                    print_info("More entries available; pass --pages to load more");
                }
                Ok(())
            }
            HistoryAction::Show { id } => {
                let entry = find_history(&list, *id)
                    .await?
                    .ok_or_else(|| CliError::NotFound(format!("history entry #{id}")))?;
                if let Some(prompt) = &entry.prompt_text {
                    println!("{}", style.key_value("Prompt", prompt));
                }
                for recipe in entry.recipes() {
                    println!("{}", style.recipe(&recipe));
                }
                Ok(())
            }
            HistoryAction::Delete { id } => {
                list.delete(*id).await?;
                print_success(&format!("Deleted history entry #{id}"));
                Ok(())
            }
        };

        drain_notices(&mut notices);
        result
    }
}
