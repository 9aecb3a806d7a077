//! Command implementation modules
//!
//! Each subcommand lives in its own module. They share a [`CommandContext`]
//! holding the resolved repository path and the merged configuration.

pub mod analyze;
pub mod preview;
pub mod run;
pub mod status;
pub mod undo;

pub use analyze::run_analyze_command;
pub use preview::run_preview_command;
pub use run::{run_run_command, RunFlags};
pub use status::run_status_command;
pub use undo::run_undo_command;

use crate::analysis::HistoryAnalyzer;
use crate::config::CadenceConfig;
use crate::error::CadenceError;
use crate::repository::Repository;
use crate::schedule::{self, Schedule, ScheduleConfig};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use tracing::{info, warn};

/// Repository path and configuration shared by every command
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub repo: PathBuf,
    pub config: CadenceConfig,
}

impl CommandContext {
    pub fn new(repo: PathBuf, config: CadenceConfig) -> Self {
        Self { repo, config }
    }

    /// Schedule parameters for today's date and the machine's UTC offset
    pub fn schedule_config(&self) -> ScheduleConfig {
        let now = Local::now();
        let offset_minutes = now.offset().local_minus_utc() / 60;
        self.config.schedule_config(now.date_naive(), offset_minutes)
    }

    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn analyzer(&self) -> HistoryAnalyzer {
        HistoryAnalyzer::with_max_count(self.config.execution.analysis_max_count)
    }
}

/// Attach the repository's hour distribution when analysis is enabled.
///
/// When history cannot be read the config is returned unchanged and the
/// generator falls back to the time window.
pub async fn resolve_distribution(
    mut config: ScheduleConfig,
    analyzer: &HistoryAnalyzer,
    history: Option<&dyn Repository>,
) -> ScheduleConfig {
    if !config.use_distribution {
        return config;
    }
    match history {
        Some(repository) => match analyzer.analyze(repository).await {
            Ok(analysis) if !analysis.distribution.is_empty() => {
                info!(
                    "Using hour distribution from {} commits",
                    analysis.total_analyzed
                );
                config.distribution = Some(analysis.distribution);
            }
            Ok(_) => warn!("No usable history; falling back to the time window"),
            Err(e) => warn!("History analysis failed, using the time window: {e:#}"),
        },
        None => warn!("No repository to analyze; using the time window"),
    }
    config
}

/// [`resolve_distribution`], then generate
pub async fn build_schedule(
    config: ScheduleConfig,
    analyzer: &HistoryAnalyzer,
    history: Option<&dyn Repository>,
) -> Result<(ScheduleConfig, Schedule)> {
    let config = resolve_distribution(config, analyzer, history).await;
    let schedule = schedule::generate(config.clone()).map_err(CadenceError::from)?;
    Ok((config, schedule))
}
