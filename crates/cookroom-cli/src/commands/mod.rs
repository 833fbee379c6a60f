// Command handlers for the cookroom CLI

pub mod analyze;
pub mod export;
pub mod favorites;
pub mod history;

pub use analyze::AnalyzeCommand;
pub use export::{ExportCommand, ExportSource};
pub use favorites::{FavoritesAction, FavoritesCommand};
pub use history::{HistoryAction, HistoryCommand};

use crate::error::CliResult;

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<()>;
}
