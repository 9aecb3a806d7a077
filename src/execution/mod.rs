//! Applying a commit plan to a repository
//!
//! [`ExecutionController`] runs one [`crate::session::ExecutionSession`] at a
//! time on a background task. Slots are applied strictly in order; progress is
//! streamed to the caller and cancellation is checked before every slot.

pub mod controller;

pub use controller::{ExecutionController, RunHandle};

use crate::git::CommitId;
use crate::session::{SessionId, SessionState};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Post-run synchronization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Pull with rebase, then push, once every commit exists
    pub auto_push: bool,
    pub remote: String,
    pub branch: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            auto_push: false,
            remote: "origin".to_string(),
            branch: "main".to_string(),
        }
    }
}

/// Sent once per created commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub session_id: SessionId,
    /// 1-based index of the commit just created
    pub current: usize,
    pub total: usize,
    pub label: String,
    pub commit: CommitId,
}

/// A commit created by a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCommit {
    pub hash: CommitId,
    /// Without the session trailer
    pub message: String,
    pub date: DateTime<FixedOffset>,
    pub file: PathBuf,
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed,
}

/// Final summary of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub session_id: SessionId,
    pub outcome: RunOutcome,
    /// Commits created before the run ended, in order
    pub commits: Vec<AppliedCommit>,
    /// Why a failed run stopped
    pub error: Option<String>,
    /// Synchronization failure after a completed run; commits remain local
    pub push_error: Option<String>,
}

impl RunResult {
    fn new(session_id: SessionId, outcome: RunOutcome, commits: Vec<AppliedCommit>) -> Self {
        Self {
            session_id,
            outcome,
            commits,
            error: None,
            push_error: None,
        }
    }

    pub fn success(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    pub fn cancelled(&self) -> bool {
        self.outcome == RunOutcome::Cancelled
    }

    /// The terminal session state this result corresponds to
    pub fn session_state(&self) -> SessionState {
        let commits = self.commits.len();
        match self.outcome {
            RunOutcome::Completed => SessionState::Completed { commits },
            RunOutcome::Cancelled => SessionState::Cancelled { commits },
            RunOutcome::Failed => SessionState::Failed {
                commits,
                error: self.error.clone().unwrap_or_default(),
            },
        }
    }
}
