//! Terminal rendering for previews, progress and results

use crate::analysis::HistoryAnalysis;
use crate::execution::{ProgressUpdate, RunOutcome, RunResult};
use crate::inspect::RepoInspection;
use crate::schedule::{HeatmapEntry, PreviewStats};
use crate::validation::ValidationReport;
use chrono::Datelike;
use indicatif::{ProgressBar, ProgressStyle};

const LEVEL_GLYPHS: [char; 5] = ['·', '░', '▒', '▓', '█'];
const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Progress bar for one run
pub struct RunProgress {
    bar: ProgressBar,
    dry_run: bool,
}

impl RunProgress {
    pub fn new(total: usize, dry_run: bool) -> Self {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        Self { bar, dry_run }
    }

    pub fn update(&self, update: &ProgressUpdate) {
        self.bar.set_position(update.current as u64);
        let verb = if self.dry_run { "would create" } else { "created" };
        self.bar.set_message(format!("{verb} {}", update.label));
    }

    pub fn cancelling(&self) {
        self.bar
            .set_message("cancelling after the current commit...".to_string());
    }

    pub fn finish(&self, result: &RunResult) {
        let message = match result.outcome {
            RunOutcome::Completed => "✓ done".to_string(),
            RunOutcome::Cancelled => "✗ cancelled".to_string(),
            RunOutcome::Failed => "✗ failed".to_string(),
        };
        self.bar.finish_with_message(message);
    }
}

/// One line per weekday, one column per week starting on Sunday
pub fn render_heatmap(entries: &[HeatmapEntry]) -> Vec<String> {
    let Some(first) = entries.first() else {
        return Vec::new();
    };
    let lead = first.date.weekday().num_days_from_sunday() as usize;
    let columns = (lead + entries.len()).div_ceil(7);

    let mut grid = vec![vec![' '; columns]; 7];
    for (offset, entry) in entries.iter().enumerate() {
        let cell = lead + offset;
        let level = usize::from(entry.level).min(LEVEL_GLYPHS.len() - 1);
        grid[cell % 7][cell / 7] = LEVEL_GLYPHS[level];
    }

    grid.into_iter()
        .zip(WEEKDAYS)
        .map(|(row, name)| {
            let cells: String = row.into_iter().flat_map(|c| [c, ' ']).collect();
            format!("{name} {}", cells.trim_end())
        })
        .collect()
}

pub fn print_stats(stats: &PreviewStats) {
    println!("📅 {} → {}", stats.start_label, stats.end_label);
    println!("  Total commits:   {}", stats.total_commits);
    println!(
        "  Active days:     {} of {} ({} skipped)",
        stats.active_days, stats.total_days, stats.skipped_days
    );
    println!("  Avg per day:     {:.1}", stats.avg_commits_per_day);
}

pub fn print_heatmap(entries: &[HeatmapEntry]) {
    for line in render_heatmap(entries) {
        println!("  {line}");
    }
    println!(
        "  less {} more",
        LEVEL_GLYPHS.iter().map(char::to_string).collect::<Vec<_>>().join(" ")
    );
}

pub fn print_validation(report: &ValidationReport) {
    for error in &report.errors {
        eprintln!("❌ {error}");
    }
    for warning in &report.warnings {
        eprintln!("⚠️  {warning}");
    }
}

pub fn print_result(result: &RunResult, dry_run: bool) {
    let count = result.commits.len();
    let noun = if dry_run { "planned" } else { "created" };
    match result.outcome {
        RunOutcome::Completed => println!("✅ {count} commits {noun} (session {})", result.session_id),
        RunOutcome::Cancelled => println!("⏹  Cancelled after {count} commits {noun}"),
        RunOutcome::Failed => eprintln!(
            "❌ Run failed after {count} commits: {}",
            result.error.as_deref().unwrap_or("unknown error")
        ),
    }
    if let Some(push_error) = &result.push_error {
        eprintln!("⚠️  Commits were created but not pushed: {push_error}");
    }
}

/// Bar chart of the hour buckets followed by weekday totals
pub fn print_analysis(analysis: &HistoryAnalysis) {
    let distribution = &analysis.distribution;
    println!(
        "📊 {} commits analyzed ({} skipped)",
        analysis.total_analyzed, analysis.skipped
    );
    let max = distribution.hours.iter().copied().max().unwrap_or(0).max(1);
    for (hour, count) in distribution.hours.iter().enumerate() {
        let width = (*count * 40 / max) as usize;
        println!("  {hour:02}:00 {:<40} {count}", "█".repeat(width));
    }
    let days: Vec<String> = WEEKDAYS
        .iter()
        .zip(distribution.days.iter())
        .map(|(name, count)| format!("{name} {count}"))
        .collect();
    println!("  {}", days.join("  "));
    if let Some(peak) = distribution.peak_hour() {
        println!("  Busiest hour: {peak:02}:00");
    }
}

pub fn print_inspection(inspection: &RepoInspection) {
    println!(
        "Branch:      {}",
        inspection.branch.as_deref().unwrap_or("(detached HEAD)")
    );
    match (&inspection.remote_name, &inspection.remote_url) {
        (Some(name), Some(url)) => println!("Remote:      {name} ({url})"),
        (Some(name), None) => println!("Remote:      {name}"),
        _ => println!("Remote:      (none)"),
    }
    println!("Uncommitted: {}", inspection.uncommitted);
    println!("Branches:    {}", inspection.local_branches.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(date: NaiveDate, level: u8) -> HeatmapEntry {
        HeatmapEntry {
            date,
            count: usize::from(level),
            level,
        }
    }

    #[test]
    fn test_empty_heatmap() {
        assert!(render_heatmap(&[]).is_empty());
    }

    #[test]
    fn test_heatmap_places_days_by_weekday() {
        // 2024-01-03 is a Wednesday
        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let entries: Vec<HeatmapEntry> = (0..7)
            .map(|i| entry(start + chrono::Days::new(i), (i % 5) as u8))
            .collect();

        let lines = render_heatmap(&entries);
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[3], "Wed ·");
        assert_eq!(lines[4], "Thu ░");
        // Sunday 2024-01-07 opens the second column
        assert_eq!(lines[0], "Sun   █");
    }
}
