//! Analyze command implementation

use super::CommandContext;
use crate::analysis::HistoryAnalyzer;
use crate::cli::display;
use crate::execution::ExecutionController;
use crate::repository::GitRepository;
use anyhow::Result;
use std::sync::Arc;

/// Print the hour and weekday histogram of recent history
pub async fn run_analyze_command(
    ctx: &CommandContext,
    max_count: Option<usize>,
    json: bool,
) -> Result<()> {
    let repository = Arc::new(GitRepository::open(&ctx.repo).await?);
    let analyzer = max_count
        .map(HistoryAnalyzer::with_max_count)
        .unwrap_or_else(|| ctx.analyzer());
    let controller = ExecutionController::new(repository).with_analyzer(analyzer);

    let analysis = controller.analyze_history().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        display::print_analysis(&analysis);
    }
    Ok(())
}
