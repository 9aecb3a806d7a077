//! Commit schedule synthesis
//!
//! A [`ScheduleConfig`] goes in; an ordered list of [`CommitSlot`]s comes out,
//! together with preview statistics and a per-day heatmap computed from the
//! same list.

pub mod config;
pub mod generator;
pub mod preview;

pub use config::{ScheduleConfig, ScheduleError, TimeWindow};
pub use generator::{weighted_hour, ScheduleGenerator, BURST_PROBABILITY, DAY_SKIP_PROBABILITY};
pub use preview::{build_heatmap, heatmap_level, HeatmapEntry, PreviewStats};

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// One scheduled commit event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSlot {
    pub timestamp: DateTime<FixedOffset>,
    pub day: NaiveDate,
}

impl CommitSlot {
    /// Calendar day as `YYYY-MM-DD`
    pub fn day_label(&self) -> String {
        self.day.format("%Y-%m-%d").to_string()
    }
}

/// Output of one generation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub slots: Vec<CommitSlot>,
    pub stats: PreviewStats,
    pub heatmap: Vec<HeatmapEntry>,
}

/// Validate `config` and generate its schedule
pub fn generate(config: ScheduleConfig) -> Result<Schedule, ScheduleError> {
    Ok(ScheduleGenerator::new(config)?.generate())
}
