//! Commit history analysis
//!
//! Reduces a bounded window of past commit timestamps to hour-of-day and
//! day-of-week frequency tables. The schedule generator can then sample commit
//! hours from the observed hour table instead of a fixed window.
//!
//! Buckets use the wall-clock time recorded with each commit (its own UTC
//! offset), and weekdays are Sunday-first (`0 = Sunday`).

use crate::git::LogEntry;
use crate::repository::Repository;
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Most recent commits read for one analysis
pub const DEFAULT_HISTORY_LIMIT: usize = 5000;

/// Raw hour and weekday counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisDistribution {
    pub hours: [u64; 24],
    /// Sunday-first
    pub days: [u64; 7],
}

impl AnalysisDistribution {
    /// Distribution with every commit in a single hour bucket
    pub fn concentrated_on_hour(hour: usize, count: u64) -> Self {
        let mut distribution = Self::default();
        if hour < 24 {
            distribution.hours[hour] = count;
        }
        distribution
    }

    pub fn total_hour_weight(&self) -> u64 {
        self.hours.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_hour_weight() == 0
    }

    /// Hour with the highest count, earliest on ties
    pub fn peak_hour(&self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let max = self.hours.iter().copied().max().unwrap_or(0);
        self.hours.iter().position(|&count| count == max)
    }

    fn record(&mut self, instant: &DateTime<FixedOffset>) {
        self.hours[instant.hour() as usize] += 1;
        self.days[instant.weekday().num_days_from_sunday() as usize] += 1;
    }
}

/// Result of one analysis pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryAnalysis {
    pub distribution: AnalysisDistribution,
    /// Entries that were read from history
    pub total_analyzed: usize,
    /// Entries whose timestamp could not be parsed
    pub skipped: usize,
}

/// Builds an [`AnalysisDistribution`] from repository history
#[derive(Debug, Clone)]
pub struct HistoryAnalyzer {
    max_count: usize,
}

impl Default for HistoryAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryAnalyzer {
    pub fn new() -> Self {
        Self {
            max_count: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_max_count(max_count: usize) -> Self {
        Self { max_count }
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Read recent history from `repository` and bucket it.
    ///
    /// A failure to read history at all is returned as a single error.
    pub async fn analyze(&self, repository: &dyn Repository) -> Result<HistoryAnalysis> {
        let entries = repository
            .recent_log(self.max_count)
            .await
            .context("Failed to read commit history")?;
        let analysis = self.analyze_entries(&entries);
        info!(
            "Analyzed {} commits ({} skipped)",
            analysis.total_analyzed, analysis.skipped
        );
        Ok(analysis)
    }

    /// Bucket already-read log entries
    pub fn analyze_entries(&self, entries: &[LogEntry]) -> HistoryAnalysis {
        let mut distribution = AnalysisDistribution::default();
        let mut skipped = 0;

        for entry in entries.iter().take(self.max_count) {
            match parse_commit_timestamp(&entry.timestamp) {
                Some(instant) => distribution.record(&instant),
                None => {
                    debug!(
                        "Skipping commit {} with unparsable date '{}'",
                        entry.id.short_hash(),
                        entry.timestamp
                    );
                    skipped += 1;
                }
            }
        }

        HistoryAnalysis {
            distribution,
            total_analyzed: entries.len().min(self.max_count),
            skipped,
        }
    }
}

/// Parse a strict ISO 8601 (`%aI`) or git default (`%ai`) timestamp
pub fn parse_commit_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z"))
        .ok()
}
