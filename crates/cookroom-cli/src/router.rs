// Command routing and dispatch

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};

use crate::{
    commands::*,
    context::AppContext,
    error::{CliError, CliResult},
};

/// Cooking Room - recipes from photos of your ingredients
#[derive(Parser, Debug)]
#[command(name = "cookroom")]
#[command(bin_name = "cookroom")]
#[command(about = "Recipes from photos of your ingredients")]
#[command(
    long_about = "Cooking Room: send photos of ingredients, get recipes back.\n\nQuick start:\n  • cookroom analyze fridge.jpg --prompt \"something spicy\"\n  • cookroom history list\n  • cookroom favorites list\n  • cookroom export --favorite 3 --out ./recipes"
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Backend URL (overrides config and COOKROOM_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Bearer token (overrides config and COOKROOM_API_TOKEN)
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Analyze ingredient photos
    #[command(about = "Send up to three ingredient photos and print the suggested recipes")]
    Analyze {
        /// Image files
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,

        /// Extra instructions for the chef
        #[arg(short, long)]
        prompt: Option<String>,

        /// Export every suggested recipe as PDF into this directory
        #[arg(long, value_name = "DIR")]
        export_dir: Option<PathBuf>,
    },

    /// Past analyses
    #[command(about = "List, show or delete past analyses")]
    History {
        #[command(subcommand)]
        action: Option<ListSubcommand>,
    },

    /// Saved recipes
    #[command(about = "List, show or delete saved recipes")]
    Favorites {
        #[command(subcommand)]
        action: Option<ListSubcommand>,
    },

    /// Export a saved recipe
    #[command(about = "Export a favorite or a history recipe as PDF")]
    Export {
        /// Favorite id
        #[arg(long, conflicts_with = "history", required_unless_present = "history")]
        favorite: Option<i64>,

        /// History entry id
        #[arg(long)]
        history: Option<i64>,

        /// Recipe name within the history entry (default: the first)
        #[arg(long, requires = "history")]
        recipe: Option<String>,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ListSubcommand {
    /// List entries
    List {
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },

    /// Show one entry
    Show {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Delete one entry
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
    },
}

/// Command router
pub struct CommandRouter;

impl CommandRouter {
    /// Parse CLI arguments and route to appropriate handler
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();

        // Initialize logging based on CLI flags
        crate::logging::init_logging(cli.verbose, cli.quiet);

        Self::execute(&cli).await
    }

    /// Execute a parsed command line
    pub async fn execute(cli: &Cli) -> CliResult<()> {
        let ctx = Arc::new(AppContext::load(cli.api_url.as_deref(), cli.token.as_deref())?);
        Self::command(cli.command.clone(), ctx)?.execute().await
    }

    /// Build the handler for a command
    pub fn command(command: Commands, ctx: Arc<AppContext>) -> CliResult<Box<dyn Command>> {
        let handler: Box<dyn Command> = match command {
            Commands::Analyze {
                images,
                prompt,
                export_dir,
            } => Box::new(
                AnalyzeCommand::new(ctx, images)
                    .with_prompt(prompt)
                    .with_export_dir(export_dir),
            ),
            Commands::History { action } => {
                let action = match action.unwrap_or(ListSubcommand::List { pages: 1 }) {
                    ListSubcommand::List { pages } => HistoryAction::List { pages },
                    ListSubcommand::Show { id } => HistoryAction::Show { id },
                    ListSubcommand::Delete { id } => HistoryAction::Delete { id },
                };
                Box::new(HistoryCommand::new(ctx, action))
            }
            Commands::Favorites { action } => {
                let action = match action.unwrap_or(ListSubcommand::List { pages: 1 }) {
                    ListSubcommand::List { pages } => FavoritesAction::List { pages },
                    ListSubcommand::Show { id } => FavoritesAction::Show { id },
                    ListSubcommand::Delete { id } => FavoritesAction::Delete { id },
                };
                Box::new(FavoritesCommand::new(ctx, action))
            }
            Commands::Export {
                favorite,
                history,
                recipe,
                out,
            } => {
                let source = match (favorite, history) {
                    (_, Some(id)) => ExportSource::History { id, recipe },
                    (Some(id), None) => ExportSource::Favorite { id },
                    (None, None) => {
                        return Err(CliError::InvalidArgument {
                            message: "export needs --favorite or --history".to_string(),
                        })
                    }
                };
                Box::new(ExportCommand::new(ctx, source, out))
            }
        };
        Ok(handler)
    }
}
