//! Pre-run checks over a complete run configuration
//!
//! Errors block a run. Warnings are shown but do not block. A `risky`
//! configuration needs explicit confirmation before a real run.

use crate::plan::MessageOptions;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;

/// Highest commits-per-day accepted for a run
pub const MAX_COMMITS_PER_DAY: u32 = 10;
/// Above this, a schedule is flagged as looking automated
pub const RISKY_COMMITS_PER_DAY: u32 = 5;
const MAX_RANGE_DAYS: i64 = 365;
const LONG_MESSAGE: usize = 200;
const MIN_POOL_SIZE: usize = 5;

/// Everything a run needs checked before it starts
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub repo_path: Option<&'a Path>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub commits_per_day: u32,
    pub messages: &'a MessageOptions,
    /// Branch commits land on; `None` on a detached HEAD
    pub checked_out: Option<&'a str>,
    /// Branch the sync step pulls and pushes
    pub branch: &'a str,
    pub auto_push: bool,
    pub use_distribution: bool,
    pub has_distribution: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub risky: bool,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate `request` as of `today`
pub fn validate_run_config(request: &RunRequest<'_>, today: NaiveDate) -> ValidationReport {
    let mut report = ValidationReport::default();

    match request.repo_path {
        Some(path) if !path.as_os_str().is_empty() => {}
        _ => report.errors.push("Repository path is required".to_string()),
    }

    check_dates(request, today, &mut report);
    check_commits_per_day(request.commits_per_day, &mut report);

    if request.messages.use_pool {
        check_pool(&request.messages.pool, &mut report);
    } else {
        check_message(&request.messages.message, &mut report);
    }

    check_branches(request, &mut report);

    if request.use_distribution && !request.has_distribution {
        report.warnings.push(
            "History-based timing requested but no analysis is available; using the time window"
                .to_string(),
        );
    }

    report
}

fn check_dates(request: &RunRequest<'_>, today: NaiveDate, report: &mut ValidationReport) {
    let (Some(start), Some(end)) = (request.start_date, request.end_date) else {
        report
            .errors
            .push("Start and end dates are required".to_string());
        return;
    };

    if start > end {
        report
            .errors
            .push("Start date must not be after end date".to_string());
        return;
    }
    if start > today {
        report
            .warnings
            .push("Start date is in the future".to_string());
    }
    if (end - start).num_days() > MAX_RANGE_DAYS {
        report
            .warnings
            .push("Date range exceeds one year".to_string());
    }
}

fn check_commits_per_day(count: u32, report: &mut ValidationReport) {
    if count < 1 {
        report
            .errors
            .push("Commits per day must be at least 1".to_string());
    } else if count > MAX_COMMITS_PER_DAY {
        report.errors.push(format!(
            "At most {MAX_COMMITS_PER_DAY} commits per day are allowed"
        ));
    } else if count > RISKY_COMMITS_PER_DAY {
        report.warnings.push(format!(
            "More than {RISKY_COMMITS_PER_DAY} commits per day looks automated"
        ));
        report.risky = true;
    }
}

fn check_message(message: &str, report: &mut ValidationReport) {
    if message.trim().is_empty() {
        report
            .errors
            .push("Commit message cannot be empty".to_string());
    } else if message.chars().count() > LONG_MESSAGE {
        report
            .warnings
            .push("Commit message is very long".to_string());
    }
}

fn check_pool(pool: &[String], report: &mut ValidationReport) {
    // An empty custom pool falls back to the built-in messages.
    if pool.is_empty() {
        return;
    }
    if pool.iter().any(|m| m.trim().is_empty()) {
        report
            .errors
            .push("Message pool contains empty messages".to_string());
    } else if pool.len() < MIN_POOL_SIZE {
        report.warnings.push(format!(
            "Message pool has fewer than {MIN_POOL_SIZE} messages"
        ));
    }
}

fn check_branches(request: &RunRequest<'_>, report: &mut ValidationReport) {
    if let Some(current) = request.checked_out {
        if current == "main" || current == "master" {
            report.warnings.push(format!(
                "Committing directly to '{current}'. Make sure this is intentional."
            ));
        }
    }

    if !request.auto_push {
        return;
    }
    let branch = request.branch.trim();
    match request.checked_out {
        _ if branch.is_empty() => report
            .errors
            .push("Pushing needs a branch: check one out or pass --branch".to_string()),
        Some(current) if current != branch => report.warnings.push(format!(
            "Commits land on '{current}' but '{branch}' is the branch pushed"
        )),
        _ => {}
    }
}
