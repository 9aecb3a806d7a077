//! User configuration: `.cadence.toml`, the global config file and
//! `CADENCE_*` environment overrides

use crate::analysis::DEFAULT_HISTORY_LIMIT;
use crate::execution::SyncOptions;
use crate::plan::MessageOptions;
use crate::random::DEFAULT_SEED;
use crate::schedule::{ScheduleConfig, TimeWindow};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub mod loader;

pub use loader::ConfigLoader;

/// File name looked up at the repository root
pub const PROJECT_CONFIG_FILE: &str = ".cadence.toml";

/// Directory holding the global `config.toml`
pub fn global_config_dir() -> Result<PathBuf> {
    ProjectDirs::from("dev", "cadence", "cadence")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine home directory"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub schedule: ScheduleSection,
    pub commits: MessageOptions,
    pub execution: ExecutionSection,
}

/// `[schedule]`: everything except the dates may be left out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    /// Defaults to today
    pub start_date: Option<NaiveDate>,
    /// Defaults to today
    pub end_date: Option<NaiveDate>,
    pub commits_per_day: u32,
    pub skip_weekends: bool,
    pub human_pattern: bool,
    pub time_window: TimeWindow,
    pub excluded_dates: BTreeSet<NaiveDate>,
    pub seed: u64,
    /// Machine's local offset when unset
    pub utc_offset_minutes: Option<i32>,
    /// Sample hours from the repository's own history
    pub use_analysis: bool,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            commits_per_day: 2,
            skip_weekends: false,
            human_pattern: false,
            time_window: TimeWindow::FullDay,
            excluded_dates: BTreeSet::new(),
            seed: DEFAULT_SEED,
            utc_offset_minutes: None,
            use_analysis: false,
        }
    }
}

/// `[execution]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    /// Branch to pull and push; the checked-out branch when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub remote: String,
    pub auto_push: bool,
    /// How many commits history analysis looks at
    pub analysis_max_count: usize,
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            branch: None,
            remote: "origin".to_string(),
            auto_push: false,
            analysis_max_count: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl CadenceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    /// Apply `CADENCE_*` overrides read through `lookup`; unparsable values are ignored
    pub fn merge_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(seed) = lookup("CADENCE_SEED") {
            match seed.trim().parse::<u64>() {
                Ok(value) => self.schedule.seed = value,
                Err(_) => tracing::warn!("Ignoring CADENCE_SEED={seed}: not a number"),
            }
        }

        if let Some(branch) = lookup("CADENCE_BRANCH") {
            self.execution.branch = Some(branch);
        }

        if let Some(remote) = lookup("CADENCE_REMOTE") {
            self.execution.remote = remote;
        }

        if let Some(auto_push) = lookup("CADENCE_AUTO_PUSH") {
            if let Ok(value) = auto_push.trim().parse::<bool>() {
                self.execution.auto_push = value;
            }
        }
    }

    /// Schedule parameters, filling missing dates with `today` and the offset with `local_offset_minutes`
    pub fn schedule_config(&self, today: NaiveDate, local_offset_minutes: i32) -> ScheduleConfig {
        let section = &self.schedule;
        let mut config = ScheduleConfig::new(
            section.start_date.unwrap_or(today),
            section.end_date.unwrap_or(today),
        )
        .with_commits_per_day(section.commits_per_day)
        .with_skip_weekends(section.skip_weekends)
        .with_human_pattern(section.human_pattern)
        .with_time_window(section.time_window)
        .with_excluded_dates(section.excluded_dates.iter().copied())
        .with_seed(section.seed)
        .with_utc_offset_minutes(section.utc_offset_minutes.unwrap_or(local_offset_minutes));
        config.use_distribution = section.use_analysis;
        config
    }

    /// Sync settings, pushing `checked_out` unless a branch is configured.
    ///
    /// The branch is empty when neither is known (detached HEAD).
    pub fn sync_options(&self, checked_out: Option<&str>) -> SyncOptions {
        let branch = self
            .execution
            .branch
            .as_deref()
            .or(checked_out)
            .unwrap_or_default()
            .to_string();
        SyncOptions {
            auto_push: self.execution.auto_push,
            remote: self.execution.remote.clone(),
            branch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = CadenceConfig::new();
        assert_eq!(config.schedule.commits_per_day, 2);
        assert_eq!(config.schedule.seed, DEFAULT_SEED);
        assert_eq!(config.schedule.time_window, TimeWindow::FullDay);
        assert_eq!(config.commits.message, "minor update");
        assert_eq!(config.execution.branch, None);
        assert_eq!(config.execution.remote, "origin");
        assert!(!config.execution.auto_push);
    }

    #[test]
    fn test_parse_partial_file() {
        let config: CadenceConfig = toml::from_str(
            r#"
            [schedule]
            start_date = "2024-03-01"
            end_date = "2024-03-31"
            commits_per_day = 4
            time_window = "evening"
            skip_weekends = true

            [commits]
            use_pool = true
            pool = ["tweak", "polish"]

            [execution]
            branch = "activity"
            "#,
        )
        .unwrap();

        assert_eq!(config.schedule.start_date, Some(date("2024-03-01")));
        assert_eq!(config.schedule.commits_per_day, 4);
        assert_eq!(config.schedule.time_window, TimeWindow::Evening);
        assert!(config.commits.use_pool);
        assert_eq!(config.commits.pool.len(), 2);
        assert_eq!(config.commits.message, "minor update");
        assert_eq!(config.execution.branch.as_deref(), Some("activity"));
        assert_eq!(config.execution.remote, "origin");
    }

    #[test]
    fn test_unknown_window_is_rejected() {
        let result: Result<CadenceConfig, _> = toml::from_str(
            r#"
            [schedule]
            time_window = "midnight"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CADENCE_SEED", "42"),
            ("CADENCE_BRANCH", "feature"),
            ("CADENCE_REMOTE", "upstream"),
            ("CADENCE_AUTO_PUSH", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = CadenceConfig::new();
        config.merge_env_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.schedule.seed, 42);
        assert_eq!(config.execution.branch.as_deref(), Some("feature"));
        assert_eq!(config.execution.remote, "upstream");
        assert!(config.execution.auto_push);
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = CadenceConfig::new();
        config.merge_env_from(|key| match key {
            "CADENCE_SEED" => Some("lots".to_string()),
            "CADENCE_AUTO_PUSH" => Some("maybe".to_string()),
            _ => None,
        });

        assert_eq!(config.schedule.seed, DEFAULT_SEED);
        assert!(!config.execution.auto_push);
    }

    #[test]
    fn test_schedule_config_fills_dates_and_offset() {
        let mut config = CadenceConfig::new();
        config.schedule.use_analysis = true;

        let schedule = config.schedule_config(date("2024-05-05"), 120);
        assert_eq!(schedule.start_date, date("2024-05-05"));
        assert_eq!(schedule.end_date, date("2024-05-05"));
        assert_eq!(schedule.utc_offset_minutes, 120);
        assert!(schedule.use_distribution);

        config.schedule.utc_offset_minutes = Some(-300);
        assert_eq!(
            config.schedule_config(date("2024-05-05"), 120).utc_offset_minutes,
            -300
        );
    }

    #[test]
    fn test_sync_branch_follows_checkout() {
        let mut config = CadenceConfig::new();
        assert_eq!(config.sync_options(Some("master")).branch, "master");
        assert_eq!(config.sync_options(None).branch, "");

        config.execution.branch = Some("activity".to_string());
        assert_eq!(config.sync_options(Some("master")).branch, "activity");
    }
}
