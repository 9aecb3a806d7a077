//! Command routing and execution
//!
//! This module resolves the repository and configuration once, then routes
//! the parsed subcommand to its implementation.

use crate::cli::args::{Cli, Commands};
use crate::cli::commands::*;
use crate::config::ConfigLoader;
use crate::random::fresh_seed;
use anyhow::{Context, Result};

/// Execute a CLI command based on the parsed arguments
pub async fn execute_command(cli: Cli) -> Result<()> {
    if let Commands::Seed = cli.command {
        println!("{}", fresh_seed());
        return Ok(());
    }

    let repo = match cli.repo {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let mut config = ConfigLoader::new(&repo)
        .with_explicit(cli.config)
        .load()
        .await?;
    cli.schedule.apply(&mut config);
    if let Commands::Run {
        branch: Some(branch),
        ..
    } = &cli.command
    {
        config.execution.branch = Some(branch.clone());
    }
    let ctx = CommandContext::new(repo, config);

    match cli.command {
        Commands::Preview { json } => run_preview_command(&ctx, json).await,
        Commands::Run {
            dry_run,
            auto_push,
            allow_dirty,
            yes,
            ..
        } => {
            run_run_command(
                &ctx,
                RunFlags {
                    dry_run,
                    auto_push,
                    allow_dirty,
                    yes,
                },
            )
            .await
        }
        Commands::Analyze { max_count, json } => run_analyze_command(&ctx, max_count, json).await,
        Commands::Status { json } => run_status_command(&ctx, json).await,
        Commands::Undo { to } => run_undo_command(&ctx, to).await,
        Commands::Seed => Ok(()),
    }
}
