//! Preview command implementation

use super::{build_schedule, CommandContext};
use crate::cli::display;
use crate::repository::{GitRepository, Repository};
use anyhow::Result;
use serde_json::json;

/// Print the stats and heatmap of the configured schedule
pub async fn run_preview_command(ctx: &CommandContext, json: bool) -> Result<()> {
    let config = ctx.schedule_config();

    let history = if config.use_distribution {
        GitRepository::open(&ctx.repo).await.ok()
    } else {
        None
    };
    let (config, schedule) = build_schedule(
        config,
        &ctx.analyzer(),
        history.as_ref().map(|r| r as &dyn Repository),
    )
    .await?;

    if json {
        let output = json!({
            "seed": config.seed,
            "stats": schedule.stats,
            "heatmap": schedule.heatmap,
            "slots": schedule.slots,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    display::print_stats(&schedule.stats);
    println!("  Seed:            {}", config.seed);
    if config.active_distribution().is_some() {
        println!("  Hours sampled from repository history");
    }
    println!();
    display::print_heatmap(&schedule.heatmap);
    Ok(())
}
