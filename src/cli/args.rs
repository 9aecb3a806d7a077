//! CLI argument structures

use crate::config::CadenceConfig;
use crate::schedule::TimeWindow;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Synthesize a reproducible commit schedule and replay it against a repository
#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "cadence - Generate and apply human-looking commit schedules", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Repository to work in (defaults to current directory)
    #[arg(short = 'C', long = "repo", global = true, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// Configuration file to use instead of .cadence.toml
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub schedule: ScheduleArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the `[schedule]` and `[commits]` configuration
#[derive(Args, Debug, Clone, Default)]
pub struct ScheduleArgs {
    /// First day of the schedule (YYYY-MM-DD)
    #[arg(long, global = true, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last day of the schedule, inclusive (YYYY-MM-DD)
    #[arg(long, global = true, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    #[arg(long, global = true, value_name = "N")]
    pub commits_per_day: Option<u32>,

    /// Leave Saturdays and Sundays empty
    #[arg(long, global = true)]
    pub skip_weekends: bool,

    /// Vary daily counts, skip some days and add occasional bursts
    #[arg(long, global = true)]
    pub human: bool,

    /// morning, afternoon, evening or full-day
    #[arg(long, global = true, value_name = "WINDOW")]
    pub window: Option<TimeWindow>,

    /// Days to leave empty (comma separated YYYY-MM-DD)
    #[arg(long, global = true, value_delimiter = ',', value_name = "DATES")]
    pub exclude: Vec<NaiveDate>,

    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Sample commit hours from the repository's own history
    #[arg(long, global = true)]
    pub use_analysis: bool,

    /// Message for every commit; supports {date}, {time} and {random}
    #[arg(short = 'm', long, global = true)]
    pub message: Option<String>,
}

impl ScheduleArgs {
    /// Layer the flags that were given on top of `config`
    pub fn apply(&self, config: &mut CadenceConfig) {
        let schedule = &mut config.schedule;
        if let Some(start) = self.start {
            schedule.start_date = Some(start);
        }
        if let Some(end) = self.end {
            schedule.end_date = Some(end);
        }
        if let Some(count) = self.commits_per_day {
            schedule.commits_per_day = count;
        }
        if let Some(window) = self.window {
            schedule.time_window = window;
        }
        if let Some(seed) = self.seed {
            schedule.seed = seed;
        }
        schedule.skip_weekends |= self.skip_weekends;
        schedule.human_pattern |= self.human;
        schedule.use_analysis |= self.use_analysis;
        schedule.excluded_dates.extend(self.exclude.iter().copied());

        if let Some(message) = &self.message {
            config.commits.message = message.clone();
            config.commits.use_pool = false;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the schedule that would be created
    #[command(name = "preview")]
    Preview {
        /// Print the slots, stats and heatmap as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create the scheduled commits
    #[command(name = "run")]
    Run {
        /// Report every planned commit without touching the repository
        #[arg(long)]
        dry_run: bool,

        /// Pull with rebase and push once every commit exists
        #[arg(long)]
        auto_push: bool,

        /// Branch to pull and push (defaults to the checked-out branch)
        #[arg(long, value_name = "NAME")]
        branch: Option<String>,

        /// Run even with uncommitted changes in the working tree
        #[arg(long)]
        allow_dirty: bool,

        /// Accept configurations flagged as risky
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },

    /// Show when commits in this repository are usually made
    #[command(name = "analyze")]
    Analyze {
        /// How many recent commits to read
        #[arg(long, value_name = "N")]
        max_count: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Show branch, remote and working tree state
    #[command(name = "status")]
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Reset the branch to where it was before the last run
    #[command(name = "undo")]
    Undo {
        /// Reset to this commit instead of the recorded one
        #[arg(long, value_name = "HASH")]
        to: Option<String>,
    },

    /// Print a fresh random seed
    #[command(name = "seed")]
    Seed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "cadence",
            "-C",
            "/tmp/repo",
            "run",
            "--dry-run",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-07",
            "--window",
            "evening",
            "--exclude",
            "2024-01-02,2024-01-03",
        ])
        .unwrap();

        assert_eq!(cli.repo, Some(PathBuf::from("/tmp/repo")));
        assert!(matches!(cli.command, Commands::Run { dry_run: true, .. }));
        assert_eq!(cli.schedule.window, Some(TimeWindow::Evening));
        assert_eq!(cli.schedule.exclude.len(), 2);
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let result = Cli::try_parse_from(["cadence", "preview", "--start", "01/02/2024"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let args = ScheduleArgs {
            commits_per_day: Some(4),
            human: true,
            seed: Some(7),
            message: Some("wip".to_string()),
            ..ScheduleArgs::default()
        };
        let mut config = CadenceConfig::new();
        config.commits.use_pool = true;

        args.apply(&mut config);

        assert_eq!(config.schedule.commits_per_day, 4);
        assert!(config.schedule.human_pattern);
        assert_eq!(config.schedule.seed, 7);
        assert_eq!(config.commits.message, "wip");
        assert!(!config.commits.use_pool);
    }

    #[test]
    fn test_apply_without_flags_keeps_config() {
        let mut config = CadenceConfig::new();
        config.schedule.skip_weekends = true;
        ScheduleArgs::default().apply(&mut config);
        assert_eq!(config.schedule.commits_per_day, 2);
        assert!(config.schedule.skip_weekends);
    }
}
