//! Views derived from a generated slot list
//!
//! Both views are computed from the same slots that get executed. They never
//! draw randomness of their own.

use super::CommitSlot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const LABEL_FORMAT: &str = "%b %d, %Y";

/// Summary numbers shown before a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewStats {
    pub total_commits: usize,
    pub total_days: usize,
    pub active_days: usize,
    pub skipped_days: usize,
    /// Rounded to one decimal; 0.0 when no day is active
    pub avg_commits_per_day: f64,
    pub start_label: String,
    pub end_label: String,
}

impl PreviewStats {
    /// Compute stats for `slots` over the calendar `days` of the range
    pub fn from_slots(slots: &[CommitSlot], days: &[NaiveDate]) -> Self {
        let per_day = count_per_day(slots);
        let total_days = days.len();
        let active_days = per_day.len();
        let avg = if active_days == 0 {
            0.0
        } else {
            round_one_decimal(slots.len() as f64 / active_days as f64)
        };

        Self {
            total_commits: slots.len(),
            total_days,
            active_days,
            skipped_days: total_days.saturating_sub(active_days),
            avg_commits_per_day: avg,
            start_label: days
                .first()
                .map(|d| d.format(LABEL_FORMAT).to_string())
                .unwrap_or_default(),
            end_label: days
                .last()
                .map(|d| d.format(LABEL_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }
}

/// One calendar day of the preview heatmap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapEntry {
    pub date: NaiveDate,
    pub count: usize,
    /// Intensity on a 0-4 scale
    pub level: u8,
}

/// Intensity level for a day's commit count
pub fn heatmap_level(count: usize) -> u8 {
    match count {
        0 => 0,
        1 => 1,
        2..=3 => 2,
        4..=5 => 3,
        _ => 4,
    }
}

/// One entry per calendar day in `days`, including days without commits
pub fn build_heatmap(slots: &[CommitSlot], days: &[NaiveDate]) -> Vec<HeatmapEntry> {
    let per_day = count_per_day(slots);
    days.iter()
        .map(|day| {
            let count = per_day.get(day).copied().unwrap_or(0);
            HeatmapEntry {
                date: *day,
                count,
                level: heatmap_level(count),
            }
        })
        .collect()
}

fn count_per_day(slots: &[CommitSlot]) -> BTreeMap<NaiveDate, usize> {
    let mut per_day = BTreeMap::new();
    for slot in slots {
        *per_day.entry(slot.day).or_insert(0) += 1;
    }
    per_day
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
