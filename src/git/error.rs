//! Git operation error types

use crate::error::{CadenceError, ErrorCode};
use thiserror::Error;

/// Git-specific errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(String),

    #[error("Nothing to commit, working tree clean")]
    NothingToCommit,

    #[error("Commit not found: {0}")]
    CommitNotFound(String),

    #[error("Repository is in detached HEAD state")]
    DetachedHead,

    #[error("git {operation} failed: {message}")]
    CommandFailed { operation: String, message: String },

    #[error("git {operation} against {remote}/{branch} failed: {message}")]
    SyncFailed {
        operation: String,
        remote: String,
        branch: String,
        message: String,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Working directory has {0} uncommitted change(s)")]
    DirtyWorkingTree(usize),
}

impl GitError {
    pub(crate) fn command_failed(operation: &str, stderr: &str) -> Self {
        let message = stderr.trim();
        GitError::CommandFailed {
            operation: operation.to_string(),
            message: if message.is_empty() {
                "no output".to_string()
            } else {
                message.to_string()
            },
        }
    }

    /// Whether this failure came from talking to a remote
    pub fn is_sync_failure(&self) -> bool {
        matches!(self, GitError::SyncFailed { .. })
    }
}

/// Convert GitError to CadenceError
impl From<GitError> for CadenceError {
    fn from(err: GitError) -> Self {
        let (code, operation) = match &err {
            GitError::NotARepository(_) => (ErrorCode::GIT_NOT_REPO, "repository check"),
            GitError::NothingToCommit => (ErrorCode::GIT_NOTHING_TO_COMMIT, "commit"),
            GitError::CommitNotFound(_) => (ErrorCode::GIT_COMMIT_NOT_FOUND, "commit lookup"),
            GitError::DetachedHead => (ErrorCode::GIT_DETACHED_HEAD, "branch check"),
            GitError::CommandFailed { .. } => (ErrorCode::GIT_COMMAND_FAILED, "command execution"),
            GitError::SyncFailed { .. } => (ErrorCode::GIT_SYNC_FAILED, "synchronization"),
            GitError::InvalidPath(_) => (ErrorCode::GIT_INVALID_PATH, "path validation"),
            GitError::DirtyWorkingTree(_) => (ErrorCode::GIT_DIRTY, "working tree check"),
        };

        CadenceError::git(code, err.to_string(), operation).with_source(err)
    }
}
