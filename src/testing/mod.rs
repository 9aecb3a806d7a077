//! Test doubles and fixtures shared by unit and integration tests

pub mod mocks;

pub use mocks::{MockRepository, RecordedCommit};

use crate::git::{CommitId, LogEntry};

/// Log entry with a fake hash derived from `n`
pub fn log_entry(n: usize, timestamp: &str) -> LogEntry {
    LogEntry {
        id: CommitId::new(format!("{n:040x}")),
        timestamp: timestamp.to_string(),
    }
}
