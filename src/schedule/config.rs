//! Schedule configuration

use crate::analysis::AnalysisDistribution;
use crate::error::{CadenceError, ErrorCode};
use crate::random::DEFAULT_SEED;
use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named time-of-day window commits are spread across
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TimeWindow {
    /// 08:00 - 12:00
    Morning,
    /// 12:00 - 17:00
    Afternoon,
    /// 17:00 - 23:00
    Evening,
    /// 08:00 - 23:00
    #[default]
    #[serde(alias = "fullDay")]
    FullDay,
}

impl TimeWindow {
    /// Hour range `[start, end)` of the window
    pub fn hours(self) -> (u32, u32) {
        match self {
            TimeWindow::Morning => (8, 12),
            TimeWindow::Afternoon => (12, 17),
            TimeWindow::Evening => (17, 23),
            TimeWindow::FullDay => (8, 23),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::Morning => "morning",
            TimeWindow::Afternoon => "afternoon",
            TimeWindow::Evening => "evening",
            TimeWindow::FullDay => "full-day",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "morning" => Ok(TimeWindow::Morning),
            "afternoon" => Ok(TimeWindow::Afternoon),
            "evening" => Ok(TimeWindow::Evening),
            "full-day" | "fullday" | "full_day" => Ok(TimeWindow::FullDay),
            other => Err(ScheduleError::UnknownTimeWindow(other.to_string())),
        }
    }
}

/// Errors detected before generation starts
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Commits per day must be at least 1")]
    NonPositiveCommitCount,

    #[error("UTC offset of {0} minutes is out of range")]
    InvalidOffset(i32),

    #[error("Unknown time window: {0}")]
    UnknownTimeWindow(String),
}

impl From<ScheduleError> for CadenceError {
    fn from(err: ScheduleError) -> Self {
        let code = match &err {
            ScheduleError::InvalidRange { .. } => ErrorCode::CONFIG_INVALID_RANGE,
            ScheduleError::NonPositiveCommitCount => ErrorCode::CONFIG_INVALID_COMMIT_COUNT,
            ScheduleError::InvalidOffset(_) | ScheduleError::UnknownTimeWindow(_) => {
                ErrorCode::CONFIG_INVALID_VALUE
            }
        };
        CadenceError::config_with_code(code, err.to_string()).with_source(err)
    }
}

/// Parameters driving one schedule generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub start_date: NaiveDate,
    /// Inclusive
    pub end_date: NaiveDate,
    #[serde(default = "default_commits_per_day")]
    pub commits_per_day: u32,
    #[serde(default)]
    pub skip_weekends: bool,
    #[serde(default)]
    pub human_pattern: bool,
    #[serde(default)]
    pub time_window: TimeWindow,
    #[serde(default)]
    pub excluded_dates: BTreeSet<NaiveDate>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Offset applied to every generated timestamp
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<AnalysisDistribution>,
    #[serde(default)]
    pub use_distribution: bool,
}

fn default_commits_per_day() -> u32 {
    2
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl ScheduleConfig {
    /// Config covering `[start, end]` with defaults for everything else
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            commits_per_day: default_commits_per_day(),
            skip_weekends: false,
            human_pattern: false,
            time_window: TimeWindow::default(),
            excluded_dates: BTreeSet::new(),
            seed: DEFAULT_SEED,
            utc_offset_minutes: 0,
            distribution: None,
            use_distribution: false,
        }
    }

    pub fn with_commits_per_day(mut self, count: u32) -> Self {
        self.commits_per_day = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = window;
        self
    }

    pub fn with_skip_weekends(mut self, skip: bool) -> Self {
        self.skip_weekends = skip;
        self
    }

    pub fn with_human_pattern(mut self, human: bool) -> Self {
        self.human_pattern = human;
        self
    }

    pub fn with_excluded_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.excluded_dates.extend(dates);
        self
    }

    pub fn with_distribution(mut self, distribution: AnalysisDistribution) -> Self {
        self.distribution = Some(distribution);
        self.use_distribution = true;
        self
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Distribution to sample hours from, if distribution timing applies
    pub fn active_distribution(&self) -> Option<&AnalysisDistribution> {
        if self.use_distribution {
            self.distribution.as_ref()
        } else {
            None
        }
    }

    /// Resolve the configured offset
    pub fn offset(&self) -> Result<FixedOffset, ScheduleError> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .ok_or(ScheduleError::InvalidOffset(self.utc_offset_minutes))
    }

    /// Reject configurations generation cannot run with
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.start_date > self.end_date {
            return Err(ScheduleError::InvalidRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.commits_per_day == 0 {
            return Err(ScheduleError::NonPositiveCommitCount);
        }
        self.offset()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_time_window_hours() {
        assert_eq!(TimeWindow::Morning.hours(), (8, 12));
        assert_eq!(TimeWindow::Afternoon.hours(), (12, 17));
        assert_eq!(TimeWindow::Evening.hours(), (17, 23));
        assert_eq!(TimeWindow::FullDay.hours(), (8, 23));
    }

    #[test]
    fn test_time_window_parse() {
        assert_eq!("morning".parse::<TimeWindow>().unwrap(), TimeWindow::Morning);
        assert_eq!("fullDay".parse::<TimeWindow>().unwrap(), TimeWindow::FullDay);
        assert_eq!("full-day".parse::<TimeWindow>().unwrap(), TimeWindow::FullDay);
        assert!("midnight".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let config = ScheduleConfig::new(date("2024-02-01"), date("2024-01-01"));
        assert!(matches!(
            config.validate(),
            Err(ScheduleError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_commits() {
        let config =
            ScheduleConfig::new(date("2024-01-01"), date("2024-01-01")).with_commits_per_day(0);
        assert_eq!(config.validate(), Err(ScheduleError::NonPositiveCommitCount));
    }

    #[test]
    fn test_validate_rejects_bad_offset() {
        let config = ScheduleConfig::new(date("2024-01-01"), date("2024-01-01"))
            .with_utc_offset_minutes(24 * 60);
        assert_eq!(config.validate(), Err(ScheduleError::InvalidOffset(1440)));
    }

    #[test]
    fn test_active_distribution_requires_flag() {
        let mut config = ScheduleConfig::new(date("2024-01-01"), date("2024-01-01"))
            .with_distribution(AnalysisDistribution::default());
        assert!(config.active_distribution().is_some());
        config.use_distribution = false;
        assert!(config.active_distribution().is_none());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ScheduleConfig = toml::from_str(
            r#"
            start_date = "2024-01-01"
            end_date = "2024-01-31"
            time_window = "fullDay"
            excluded_dates = ["2024-01-15"]
            "#,
        )
        .unwrap();
        assert_eq!(config.commits_per_day, 2);
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.time_window, TimeWindow::FullDay);
        assert!(config.excluded_dates.contains(&date("2024-01-15")));
    }

    #[test]
    fn test_schedule_error_maps_to_config_code() {
        let err: CadenceError = ScheduleError::NonPositiveCommitCount.into();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_COMMIT_COUNT);
    }
}
