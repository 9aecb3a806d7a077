//! Git output parsers

use super::types::*;

/// Format string passed to `git log` so [`parse_log_output`] can read it
pub const LOG_FORMAT: &str = "--format=%H %aI";

/// Parse `git log --format="%H %aI"` output.
///
/// Lines without a hash/timestamp pair are dropped; timestamps are kept raw.
pub fn parse_log_output(output: &str) -> Vec<LogEntry> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (hash, timestamp) = line.split_once(' ')?;
            if hash.is_empty() {
                return None;
            }
            Some(LogEntry {
                id: CommitId::from(hash),
                timestamp: timestamp.trim().to_string(),
            })
        })
        .collect()
}

/// Parse the single hash printed by `git rev-parse`
pub fn parse_rev_parse_output(output: &str) -> Option<CommitId> {
    let hash = output.lines().next()?.trim();
    let commit = CommitId::from(hash);
    commit.is_valid().then_some(commit)
}
