//! In-memory repository for execution tests

use crate::git::{CommitId, GitError, LogEntry};
use crate::repository::{ensure_relative, Repository};
use crate::session::SessionRegistry;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

static MOCK_TREES: AtomicU64 = AtomicU64::new(0);

/// A commit as the mock received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommit {
    pub id: CommitId,
    pub message: String,
    pub authored: DateTime<FixedOffset>,
    pub files: Vec<PathBuf>,
}

#[derive(Default)]
struct MockState {
    files: HashMap<PathBuf, String>,
    staged: Vec<PathBuf>,
    commits: Vec<RecordedCommit>,
    calls: Vec<String>,
}

/// Scriptable [`Repository`] that keeps everything in memory.
///
/// Failures and cancellation are injected by commit number, counted from 1.
/// Every instance is its own working tree.
pub struct MockRepository {
    tree: String,
    state: Mutex<MockState>,
    fail_commit_at: Option<usize>,
    fail_pull: Option<String>,
    fail_push: Option<String>,
    fail_log: Option<String>,
    cancel_after: Option<(usize, SessionRegistry)>,
    log: Vec<LogEntry>,
    head: Option<CommitId>,
}

impl Default for MockRepository {
    fn default() -> Self {
        Self {
            tree: format!("memory-{}", MOCK_TREES.fetch_add(1, Ordering::Relaxed)),
            state: Mutex::default(),
            fail_commit_at: None,
            fail_pull: None,
            fail_push: None,
            fail_log: None,
            cancel_after: None,
            log: Vec::new(),
            head: None,
        }
    }
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`-th commit fail
    pub fn fail_commit_at(mut self, n: usize) -> Self {
        self.fail_commit_at = Some(n);
        self
    }

    pub fn fail_pull(mut self, message: &str) -> Self {
        self.fail_pull = Some(message.to_string());
        self
    }

    pub fn fail_push(mut self, message: &str) -> Self {
        self.fail_push = Some(message.to_string());
        self
    }

    /// Make `recent_log` fail outright
    pub fn fail_log(mut self, message: &str) -> Self {
        self.fail_log = Some(message.to_string());
        self
    }

    /// Request cancellation through `registry` right after the `n`-th commit
    pub fn cancel_after(mut self, n: usize, registry: SessionRegistry) -> Self {
        self.cancel_after = Some((n, registry));
        self
    }

    pub fn with_log(mut self, entries: Vec<LogEntry>) -> Self {
        self.log = entries;
        self
    }

    pub fn with_head(mut self, head: CommitId) -> Self {
        self.head = Some(head);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn commits(&self) -> Vec<RecordedCommit> {
        self.lock().commits.clone()
    }

    /// Every call in order, e.g. `"stage notes.md"` or `"push origin main"`
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.lock().files.get(Path::new(path)).cloned()
    }

    fn count_calls(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn push_attempts(&self) -> usize {
        self.count_calls("push ")
    }

    pub fn pull_attempts(&self) -> usize {
        self.count_calls("pull ")
    }
}

#[async_trait]
impl Repository for MockRepository {
    fn working_tree(&self) -> String {
        self.tree.clone()
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        ensure_relative(path)?;
        let mut state = self.lock();
        state.calls.push(format!("write {}", path.display()));
        state.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    async fn stage(&self, path: &Path) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(format!("stage {}", path.display()));
        state.staged.push(path.to_path_buf());
        Ok(())
    }

    async fn commit(&self, message: &str, authored: DateTime<FixedOffset>) -> Result<CommitId> {
        let number = {
            let mut state = self.lock();
            state.calls.push("commit".to_string());
            let number = state.commits.len() + 1;

            if self.fail_commit_at == Some(number) {
                return Err(GitError::CommandFailed {
                    operation: "commit".to_string(),
                    message: format!("injected failure at commit {number}"),
                }
                .into());
            }
            if state.staged.is_empty() {
                return Err(GitError::NothingToCommit.into());
            }

            let id = CommitId::new(format!("{number:040x}"));
            let files = std::mem::take(&mut state.staged);
            state.commits.push(RecordedCommit {
                id: id.clone(),
                message: message.to_string(),
                authored,
                files,
            });
            number
        };

        if let Some((after, registry)) = &self.cancel_after {
            if *after == number {
                let _ = registry.cancel_active();
            }
        }

        Ok(CommitId::new(format!("{number:040x}")))
    }

    async fn pull_rebase(&self, remote: &str, branch: &str) -> Result<()> {
        self.lock().calls.push(format!("pull {remote} {branch}"));
        match &self.fail_pull {
            Some(message) => Err(sync_error("pull --rebase", remote, branch, message).into()),
            None => Ok(()),
        }
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.lock().calls.push(format!("push {remote} {branch}"));
        match &self.fail_push {
            Some(message) => Err(sync_error("push", remote, branch, message).into()),
            None => Ok(()),
        }
    }

    async fn recent_log(&self, max_count: usize) -> Result<Vec<LogEntry>> {
        self.lock().calls.push(format!("log {max_count}"));
        match &self.fail_log {
            Some(message) => Err(GitError::command_failed("log", message).into()),
            None => Ok(self.log.iter().take(max_count).cloned().collect()),
        }
    }

    async fn head_commit_id(&self) -> Result<Option<CommitId>> {
        let state = self.lock();
        Ok(state
            .commits
            .last()
            .map(|c| c.id.clone())
            .or_else(|| self.head.clone()))
    }

    async fn reset_hard(&self, commit: &CommitId) -> Result<()> {
        self.lock().calls.push(format!("reset {commit}"));
        Ok(())
    }
}

fn sync_error(operation: &str, remote: &str, branch: &str, message: &str) -> GitError {
    GitError::SyncFailed {
        operation: operation.to_string(),
        remote: remote.to_string(),
        branch: branch.to_string(),
        message: message.to_string(),
    }
}
