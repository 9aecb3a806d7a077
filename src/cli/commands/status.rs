//! Status command implementation

use super::CommandContext;
use crate::cli::display;
use crate::inspect::{inspect_repository, query_blocking, session_commits};
use crate::ledger::RunLedger;
use anyhow::Result;
use serde_json::json;

/// Commits walked back when matching the last run's trailer
const TRAILER_SEARCH_DEPTH: usize = 10_000;

/// Print repository state and a summary of the last recorded run
pub async fn run_status_command(ctx: &CommandContext, json: bool) -> Result<()> {
    let inspection = query_blocking(&ctx.repo, inspect_repository).await?;
    let last_run = RunLedger::for_repository(&ctx.repo).await?.load().await?;
    let reachable = match &last_run {
        Some(record) => {
            let session = record.session_id.clone();
            let found = query_blocking(&ctx.repo, move |path| {
                session_commits(path, &session, TRAILER_SEARCH_DEPTH)
            })
            .await?;
            Some(found.len())
        }
        None => None,
    };

    if json {
        let output = json!({
            "repository": inspection,
            "last_run": last_run,
            "last_run_commits_on_head": reachable,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    display::print_inspection(&inspection);
    match (last_run, reachable) {
        (Some(record), Some(reachable)) => {
            println!(
                "Last run:    {} ({} commits recorded, {} on HEAD)",
                record.session_id,
                record.commits.len(),
                reachable
            );
        }
        _ => println!("Last run:    (none)"),
    }
    Ok(())
}
