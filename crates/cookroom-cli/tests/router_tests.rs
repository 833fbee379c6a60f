//! Command-line parsing and dispatch

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use cookroom_api::ApiConfig;
use cookroom_cli::{AppContext, Cli, CliError, CommandRouter, Commands, ListSubcommand};
use cookroom_export::ExportConfig;
use cookroom_images::ImageConfig;
use cookroom_sessions::SessionConfig;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_analyze_with_prompt_and_export_dir() {
    let cli = parse(&[
        "cookroom",
        "analyze",
        "fridge.jpg",
        "pantry.png",
        "--prompt",
        "something spicy",
        "--export-dir",
        "out",
    ]);

    match cli.command {
        Commands::Analyze {
            images,
            prompt,
            export_dir,
        } => {
            assert_eq!(images, vec![PathBuf::from("fridge.jpg"), PathBuf::from("pantry.png")]);
            assert_eq!(prompt.as_deref(), Some("something spicy"));
            assert_eq!(export_dir, Some(PathBuf::from("out")));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_analyze_requires_an_image() {
    assert!(Cli::try_parse_from(["cookroom", "analyze"]).is_err());
}

#[test]
fn test_history_without_action_defaults_to_listing() {
    let cli = parse(&["cookroom", "history"]);
    assert!(matches!(cli.command, Commands::History { action: None }));
}

#[test]
fn test_history_list_pages_and_delete() {
    let cli = parse(&["cookroom", "history", "list", "--pages", "3"]);
    assert!(matches!(
        cli.command,
        Commands::History {
            action: Some(ListSubcommand::List { pages: 3 })
        }
    ));

    let cli = parse(&["cookroom", "history", "delete", "42"]);
    assert!(matches!(
        cli.command,
        Commands::History {
            action: Some(ListSubcommand::Delete { id: 42 })
        }
    ));
}

#[test]
fn test_favorites_show() {
    let cli = parse(&["cookroom", "favorites", "show", "7"]);
    assert!(matches!(
        cli.command,
        Commands::Favorites {
            action: Some(ListSubcommand::Show { id: 7 })
        }
    ));
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&[
        "cookroom",
        "favorites",
        "--verbose",
        "--api-url",
        "http://kitchen:9000",
        "--token",
        "abc",
    ]);
    assert!(cli.verbose);
    assert!(!cli.quiet);
    assert_eq!(cli.api_url.as_deref(), Some("http://kitchen:9000"));
    assert_eq!(cli.token.as_deref(), Some("abc"));
}

#[test]
fn test_export_sources() {
    let cli = parse(&["cookroom", "export", "--favorite", "3", "--out", "pdfs"]);
    match cli.command {
        Commands::Export {
            favorite,
            history,
            recipe,
            out,
        } => {
            assert_eq!(favorite, Some(3));
            assert_eq!(history, None);
            assert_eq!(recipe, None);
            assert_eq!(out, PathBuf::from("pdfs"));
        }
        other => panic!("unexpected command: {other:?}"),
    }

    let cli = parse(&["cookroom", "export", "--history", "9", "--recipe", "Japchae"]);
    match cli.command {
        Commands::Export {
            history,
            recipe,
            out,
            ..
        } => {
            assert_eq!(history, Some(9));
            assert_eq!(recipe.as_deref(), Some("Japchae"));
            assert_eq!(out, PathBuf::from("."));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_export_argument_conflicts() {
    assert!(Cli::try_parse_from(["cookroom", "export"]).is_err());
    assert!(
        Cli::try_parse_from(["cookroom", "export", "--favorite", "1", "--history", "2"]).is_err()
    );
    assert!(
        Cli::try_parse_from(["cookroom", "export", "--favorite", "1", "--recipe", "Soup"]).is_err()
    );
}

#[test]
fn test_export_without_source_is_rejected_by_router() {
    let ctx = AppContext::from_parts(
        ApiConfig::new("http://127.0.0.1:9"),
        ImageConfig::default(),
        ExportConfig::default(),
        SessionConfig::default(),
    )
    .unwrap();

    let result = CommandRouter::command(
        Commands::Export {
            favorite: None,
            history: None,
            recipe: None,
            out: PathBuf::from("."),
        },
        Arc::new(ctx),
    );
    assert!(matches!(result, Err(CliError::InvalidArgument { .. })));
}
