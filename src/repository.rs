//! The repository surface consumed by execution and analysis
//!
//! [`Repository`] is the whole set of version-control capabilities the run
//! loop and the history analyzer need. [`GitRepository`] backs it with the git
//! command layer; [`DryRunRepository`] accepts every call without touching
//! disk.

use crate::git::{CommitId, GitCommandRunner, GitError, GitOperations, LogEntry};
use crate::subprocess::TokioProcessRunner;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Version-control operations against one working tree.
///
/// Paths are relative to the repository root.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Identifies the working tree; controllers on the same tree share one
    /// single-admission gate
    fn working_tree(&self) -> String;

    /// Create or overwrite a file
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Add a path to the next commit
    async fn stage(&self, path: &Path) -> Result<()>;

    /// Commit staged changes with author and committer date `authored`
    async fn commit(&self, message: &str, authored: DateTime<FixedOffset>) -> Result<CommitId>;

    async fn pull_rebase(&self, remote: &str, branch: &str) -> Result<()>;

    async fn push(&self, remote: &str, branch: &str) -> Result<()>;

    /// Most recent non-merge commits, newest first
    async fn recent_log(&self, max_count: usize) -> Result<Vec<LogEntry>>;

    /// `None` for a repository without commits
    async fn head_commit_id(&self) -> Result<Option<CommitId>>;

    /// Reset index and working tree to `commit`
    async fn reset_hard(&self, commit: &CommitId) -> Result<()>;
}

/// Reject absolute paths and anything that climbs out of the root
pub fn ensure_relative(path: &Path) -> Result<(), GitError> {
    let escapes = path.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || path.as_os_str().is_empty() {
        return Err(GitError::InvalidPath(path.display().to_string()));
    }
    Ok(())
}

/// A working tree driven through the `git` binary
pub struct GitRepository {
    root: PathBuf,
    git: Arc<dyn GitOperations>,
}

impl GitRepository {
    pub fn new(root: impl Into<PathBuf>, git: Arc<dyn GitOperations>) -> Self {
        Self {
            root: root.into(),
            git,
        }
    }

    /// Open `root` with the real git binary, failing if it is not a repository
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let git: Arc<dyn GitOperations> =
            Arc::new(GitCommandRunner::new(Arc::new(TokioProcessRunner)));
        if !git.is_repository(&root).await? {
            return Err(GitError::NotARepository(root.display().to_string()).into());
        }
        let root = tokio::fs::canonicalize(&root).await.unwrap_or(root);
        Ok(Self::new(root, git))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the checked-out branch
    pub async fn current_branch(&self) -> Result<String> {
        self.git.get_current_branch(&self.root).await
    }
}

#[async_trait]
impl Repository for GitRepository {
    fn working_tree(&self) -> String {
        self.root.display().to_string()
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        ensure_relative(path)?;
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&target, content)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))
    }

    async fn stage(&self, path: &Path) -> Result<()> {
        ensure_relative(path)?;
        self.git
            .stage_files(&self.root, &[path.to_path_buf()])
            .await
    }

    async fn commit(&self, message: &str, authored: DateTime<FixedOffset>) -> Result<CommitId> {
        self.git.commit_at(&self.root, message, authored).await
    }

    async fn pull_rebase(&self, remote: &str, branch: &str) -> Result<()> {
        self.git.pull_rebase(&self.root, remote, branch).await
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.git.push(&self.root, remote, branch).await
    }

    async fn recent_log(&self, max_count: usize) -> Result<Vec<LogEntry>> {
        self.git.recent_log(&self.root, max_count).await
    }

    async fn head_commit_id(&self) -> Result<Option<CommitId>> {
        self.git.head_commit(&self.root).await
    }

    async fn reset_hard(&self, commit: &CommitId) -> Result<()> {
        self.git.reset_hard(&self.root, commit).await
    }
}

/// Accepts every write and hands out placeholder commit ids.
///
/// Used for `--dry-run` so the real run loop, progress reporting and session
/// trailer logic all execute without a single filesystem or git call.
#[derive(Debug)]
pub struct DryRunRepository {
    label: String,
    commits: AtomicU64,
}

static DRY_RUNS: AtomicU64 = AtomicU64::new(0);

impl DryRunRepository {
    pub fn new() -> Self {
        Self {
            label: format!("dry-run-{}", DRY_RUNS.fetch_add(1, Ordering::Relaxed)),
            commits: AtomicU64::new(0),
        }
    }
}

impl Default for DryRunRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for DryRunRepository {
    fn working_tree(&self) -> String {
        self.label.clone()
    }

    async fn write_file(&self, path: &Path, _content: &str) -> Result<()> {
        ensure_relative(path)?;
        Ok(())
    }

    async fn stage(&self, path: &Path) -> Result<()> {
        ensure_relative(path)?;
        Ok(())
    }

    async fn commit(&self, _message: &str, _authored: DateTime<FixedOffset>) -> Result<CommitId> {
        let n = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CommitId::new(format!("{n:040x}")))
    }

    async fn pull_rebase(&self, _remote: &str, _branch: &str) -> Result<()> {
        Ok(())
    }

    async fn push(&self, _remote: &str, _branch: &str) -> Result<()> {
        Ok(())
    }

    async fn recent_log(&self, _max_count: usize) -> Result<Vec<LogEntry>> {
        Ok(Vec::new())
    }

    async fn head_commit_id(&self) -> Result<Option<CommitId>> {
        Ok(None)
    }

    async fn reset_hard(&self, _commit: &CommitId) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitCommandRunner;
    use crate::subprocess::{MockProcessRunner, ProcessRunner};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn mock_repository(root: &Path) -> (GitRepository, MockProcessRunner) {
        let mock = MockProcessRunner::new();
        let git = GitCommandRunner::new(Arc::new(mock.clone()) as Arc<dyn ProcessRunner>);
        (GitRepository::new(root, Arc::new(git)), mock)
    }

    #[test]
    fn test_ensure_relative() {
        assert!(ensure_relative(Path::new("notes.md")).is_ok());
        assert!(ensure_relative(Path::new("docs/notes.md")).is_ok());
        assert!(ensure_relative(Path::new("../outside.txt")).is_err());
        assert!(ensure_relative(Path::new("/etc/passwd")).is_err());
        assert!(ensure_relative(Path::new("")).is_err());
    }

    #[tokio::test]
    async fn test_write_file_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let (repo, mock) = mock_repository(temp_dir.path());

        repo.write_file(Path::new("nested/dir/activity.txt"), "entry\n")
            .await
            .unwrap();

        let written = std::fs::read_to_string(temp_dir.path().join("nested/dir/activity.txt"))
            .unwrap();
        assert_eq!(written, "entry\n");
        assert!(mock.get_call_history().is_empty());
    }

    #[tokio::test]
    async fn test_stage_uses_relative_path() {
        let temp_dir = TempDir::new().unwrap();
        let (repo, mut mock) = mock_repository(temp_dir.path());
        mock.expect_command("git")
            .with_args(|args| args == ["add", "--", "todo.txt"])
            .returns_success()
            .finish();

        repo.stage(Path::new("todo.txt")).await.unwrap();

        let calls = mock.get_call_history();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].working_dir.as_deref(), Some(temp_dir.path()));
    }

    #[tokio::test]
    async fn test_stage_rejects_escaping_path() {
        let temp_dir = TempDir::new().unwrap();
        let (repo, mock) = mock_repository(temp_dir.path());

        let err = repo.stage(Path::new("../x")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GitError>(),
            Some(GitError::InvalidPath(_))
        ));
        assert!(mock.get_call_history().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_repository_hands_out_distinct_ids() {
        let repo = DryRunRepository::new();
        let date = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
            .unwrap();

        let first = repo.commit("a", date).await.unwrap();
        let second = repo.commit("b", date).await.unwrap();

        assert_ne!(first, second);
        assert!(first.is_valid());
        assert_eq!(repo.head_commit_id().await.unwrap(), None);
    }
}
