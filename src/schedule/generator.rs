//! Schedule synthesis
//!
//! Draw order is part of the reproducibility contract. For every day that
//! survives the weekend and exclusion filters:
//!
//! 1. day-skip draw (human pattern only)
//! 2. count-variance draw (human pattern only)
//! 3. burst-trigger draw (human pattern only)
//! 4. burst-size draw (only when the trigger fired)
//! 5. per commit: hour draw, minute draw, second draw
//!
//! Filtered days consume no draws. With distribution timing the hour draw is
//! consumed even when every bucket is empty.

use super::config::{ScheduleConfig, ScheduleError};
use super::preview::{build_heatmap, PreviewStats};
use super::{CommitSlot, Schedule};
use crate::analysis::AnalysisDistribution;
use crate::random::SeededRandom;
use chrono::{Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Weekday};
use tracing::debug;

/// Probability that a human-pattern day has no activity
pub const DAY_SKIP_PROBABILITY: f64 = 0.15;
/// Probability that a human-pattern day gets a burst of extra commits
pub const BURST_PROBABILITY: f64 = 0.10;
/// Hour used when a distribution has no weight at all
pub const FALLBACK_HOUR: u32 = 12;

/// Turns a [`ScheduleConfig`] into concrete commit slots
#[derive(Debug, Clone)]
pub struct ScheduleGenerator {
    config: ScheduleConfig,
    offset: FixedOffset,
}

impl ScheduleGenerator {
    /// Validate `config` and build a generator for it
    pub fn new(config: ScheduleConfig) -> Result<Self, ScheduleError> {
        config.validate()?;
        let offset = config.offset()?;
        Ok(Self { config, offset })
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Generate slots, preview statistics and heatmap from one pass.
    ///
    /// Pure: identical configs always produce identical schedules.
    pub fn generate(&self) -> Schedule {
        let slots = self.generate_slots();
        let days = self.days().collect::<Vec<_>>();
        let stats = PreviewStats::from_slots(&slots, &days);
        let heatmap = build_heatmap(&slots, &days);

        debug!(
            "Generated {} slots over {} days (seed {})",
            slots.len(),
            days.len(),
            self.config.seed
        );

        Schedule {
            slots,
            stats,
            heatmap,
        }
    }

    /// Generate only the ordered slot list
    pub fn generate_slots(&self) -> Vec<CommitSlot> {
        let mut rng = SeededRandom::new(self.config.seed);
        let mut slots = Vec::new();

        for day in self.days() {
            if self.config.skip_weekends && is_weekend(day) {
                continue;
            }
            if self.config.excluded_dates.contains(&day) {
                continue;
            }

            let Some(count) = self.commits_for_day(&mut rng) else {
                continue;
            };

            for _ in 0..count {
                let time = self.draw_time(&mut rng);
                slots.push(self.slot(day, time));
            }
        }

        slots
    }

    /// Every calendar day in the configured range
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.config.end_date;
        self.config
            .start_date
            .iter_days()
            .take_while(move |day| *day <= end)
    }

    /// Number of commits for a day that passed the filters, or `None` if the
    /// human pattern skipped it
    fn commits_for_day(&self, rng: &mut SeededRandom) -> Option<u32> {
        let baseline = self.config.commits_per_day;
        if !self.config.human_pattern {
            return Some(baseline);
        }

        if rng.chance(DAY_SKIP_PROBABILITY) {
            return None;
        }

        let variance = rng.next_below(3) as i64 - 1;
        let mut count = (i64::from(baseline) + variance).max(1) as u32;

        if rng.chance(BURST_PROBABILITY) {
            count += rng.next_in_range(1, 4);
        }

        Some(count)
    }

    fn draw_time(&self, rng: &mut SeededRandom) -> NaiveTime {
        let hour = match self.config.active_distribution() {
            Some(distribution) => weighted_hour(distribution, rng.next_f64()),
            None => {
                let (start, end) = self.config.time_window.hours();
                rng.next_in_range(start, end)
            }
        };
        let minute = rng.next_below(60);
        let second = rng.next_below(60);
        NaiveTime::from_hms_opt(hour, minute, second).unwrap_or(NaiveTime::MIN)
    }

    fn slot(&self, day: NaiveDate, time: NaiveTime) -> CommitSlot {
        // Fixed offsets never produce ambiguous or missing local times
        let timestamp = self
            .offset
            .from_local_datetime(&day.and_time(time))
            .single()
            .unwrap_or_else(|| self.offset.from_utc_datetime(&day.and_time(time)));
        CommitSlot { timestamp, day }
    }
}

/// Select an hour with probability proportional to its bucket weight.
///
/// `draw` is a value in `[0, 1)`. Zero-weight buckets are never selected;
/// an all-zero table yields [`FALLBACK_HOUR`].
pub fn weighted_hour(distribution: &AnalysisDistribution, draw: f64) -> u32 {
    let total = distribution.total_hour_weight();
    if total == 0 {
        return FALLBACK_HOUR;
    }

    let target = draw * total as f64;
    let mut cumulative = 0u64;
    for (hour, &weight) in distribution.hours.iter().enumerate() {
        cumulative += weight;
        if weight > 0 && (cumulative as f64) > target {
            return hour as u32;
        }
    }

    // draw is < 1, so only float rounding can land here
    distribution
        .hours
        .iter()
        .rposition(|&weight| weight > 0)
        .map(|hour| hour as u32)
        .unwrap_or(FALLBACK_HOUR)
}

fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}
