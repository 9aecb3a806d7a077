//! Git command layer
//!
//! Every git invocation the tool makes goes through [`GitCommandRunner`], which
//! drives the `git` binary via a [`ProcessRunner`] so that tests can swap in
//! [`crate::subprocess::MockProcessRunner`].

pub mod error;
pub mod parsers;
pub mod types;

pub use error::GitError;
pub use parsers::*;
pub use types::*;

use crate::subprocess::{ProcessCommandBuilder, ProcessOutput, ProcessRunner};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Git read operations
#[async_trait]
pub trait GitReader: Send + Sync {
    /// Check if a directory is a git repository
    async fn is_repository(&self, path: &Path) -> Result<bool>;

    /// Get the current branch name
    async fn get_current_branch(&self, path: &Path) -> Result<String>;

    /// Hash of HEAD, or `None` when the repository has no commits yet
    async fn head_commit(&self, path: &Path) -> Result<Option<CommitId>>;

    /// Up to `max_count` most recent non-merge commits with author timestamps
    async fn recent_log(&self, path: &Path, max_count: usize) -> Result<Vec<LogEntry>>;
}

/// Git write operations
#[async_trait]
pub trait GitWriter: Send + Sync {
    /// Stage specific files
    async fn stage_files(&self, path: &Path, files: &[PathBuf]) -> Result<()>;

    /// Commit staged changes with author and committer dates set to `date`
    async fn commit_at(
        &self,
        path: &Path,
        message: &str,
        date: DateTime<FixedOffset>,
    ) -> Result<CommitId>;

    /// Move HEAD, index and working tree to `commit`
    async fn reset_hard(&self, path: &Path, commit: &CommitId) -> Result<()>;
}

/// Remote synchronization
#[async_trait]
pub trait GitRemote: Send + Sync {
    /// `git pull --rebase <remote> <branch>`
    async fn pull_rebase(&self, path: &Path, remote: &str, branch: &str) -> Result<()>;

    /// `git push <remote> <branch>`
    async fn push(&self, path: &Path, remote: &str, branch: &str) -> Result<()>;
}

/// Combined trait for all git operations
pub trait GitOperations: GitReader + GitWriter + GitRemote {}

impl<T: GitReader + GitWriter + GitRemote> GitOperations for T {}

/// Production implementation of git operations
pub struct GitCommandRunner {
    process_runner: Arc<dyn ProcessRunner>,
}

impl GitCommandRunner {
    /// Create a new GitCommandRunner
    pub fn new(process_runner: Arc<dyn ProcessRunner>) -> Self {
        Self { process_runner }
    }

    /// Execute a git command
    async fn run_git_command(&self, path: &Path, args: &[&str]) -> Result<ProcessOutput> {
        self.run_git_command_with_env(path, args, &[]).await
    }

    async fn run_git_command_with_env(
        &self,
        path: &Path,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<ProcessOutput> {
        let command = ProcessCommandBuilder::git(path)
            .args(args)
            .envs(env.iter().copied())
            .build();

        tracing::trace!("git {}", args.join(" "));

        self.process_runner.run(command).await.map_err(|e| {
            GitError::command_failed(args.first().copied().unwrap_or("git"), &e.to_string())
                .into()
        })
    }

    async fn sync(&self, path: &Path, args: &[&str], remote: &str, branch: &str) -> Result<()> {
        let output = self.run_git_command(path, args).await?;
        if !output.status.success() {
            return Err(GitError::SyncFailed {
                operation: args.join(" "),
                remote: remote.to_string(),
                branch: branch.to_string(),
                message: output.error_text().to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn has_no_commits(stderr: &str) -> bool {
    stderr.contains("does not have any commits")
        || stderr.contains("unknown revision")
        || stderr.contains("ambiguous argument 'HEAD'")
}

#[async_trait]
impl GitReader for GitCommandRunner {
    async fn is_repository(&self, path: &Path) -> Result<bool> {
        match self
            .run_git_command(path, &["rev-parse", "--git-dir"])
            .await
        {
            Ok(output) => Ok(output.status.success()),
            Err(_) => Ok(false),
        }
    }

    async fn get_current_branch(&self, path: &Path) -> Result<String> {
        let output = self
            .run_git_command(path, &["branch", "--show-current"])
            .await?;

        if !output.status.success() {
            return Err(GitError::command_failed("branch", &output.stderr).into());
        }

        let branch = output.stdout.trim();
        if branch.is_empty() {
            return Err(GitError::DetachedHead.into());
        }

        Ok(branch.to_string())
    }

    async fn head_commit(&self, path: &Path) -> Result<Option<CommitId>> {
        let output = self
            .run_git_command(path, &["rev-parse", "--verify", "HEAD"])
            .await?;

        if !output.status.success() {
            if has_no_commits(&output.stderr) || output.stderr.contains("Needed a single revision")
            {
                return Ok(None);
            }
            return Err(GitError::command_failed("rev-parse", &output.stderr).into());
        }

        Ok(parsers::parse_rev_parse_output(&output.stdout))
    }

    async fn recent_log(&self, path: &Path, max_count: usize) -> Result<Vec<LogEntry>> {
        let count = max_count.to_string();
        let output = self
            .run_git_command(
                path,
                &["log", parsers::LOG_FORMAT, "--no-merges", "-n", &count],
            )
            .await?;

        if !output.status.success() {
            if has_no_commits(&output.stderr) {
                return Ok(Vec::new());
            }
            return Err(GitError::command_failed("log", &output.stderr).into());
        }

        Ok(parsers::parse_log_output(&output.stdout))
    }
}

#[async_trait]
impl GitWriter for GitCommandRunner {
    async fn stage_files(&self, path: &Path, files: &[PathBuf]) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }

        let file_strs: Vec<String> = files
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        let mut args = vec!["add", "--"];
        args.extend(file_strs.iter().map(String::as_str));

        let output = self.run_git_command(path, &args).await?;

        if !output.status.success() {
            return Err(GitError::command_failed("add", &output.stderr).into());
        }

        Ok(())
    }

    async fn commit_at(
        &self,
        path: &Path,
        message: &str,
        date: DateTime<FixedOffset>,
    ) -> Result<CommitId> {
        let date = date.to_rfc3339();
        let output = self
            .run_git_command_with_env(
                path,
                &["commit", "-m", message, "--date", &date],
                &[("GIT_COMMITTER_DATE", &date)],
            )
            .await?;

        if !output.status.success() {
            if output.mentions("nothing to commit") {
                return Err(GitError::NothingToCommit.into());
            }
            return Err(GitError::command_failed("commit", &output.stderr).into());
        }

        let hash_output = self.run_git_command(path, &["rev-parse", "HEAD"]).await?;
        parsers::parse_rev_parse_output(&hash_output.stdout)
            .ok_or_else(|| GitError::CommitNotFound("HEAD".to_string()).into())
    }

    async fn reset_hard(&self, path: &Path, commit: &CommitId) -> Result<()> {
        let output = self
            .run_git_command(path, &["reset", "--hard", commit.hash()])
            .await?;

        if !output.status.success() {
            if output.stderr.contains("unknown revision") {
                return Err(GitError::CommitNotFound(commit.to_string()).into());
            }
            return Err(GitError::command_failed("reset", &output.stderr).into());
        }

        Ok(())
    }
}

#[async_trait]
impl GitRemote for GitCommandRunner {
    async fn pull_rebase(&self, path: &Path, remote: &str, branch: &str) -> Result<()> {
        self.sync(path, &["pull", "--rebase", remote, branch], remote, branch)
            .await
    }

    async fn push(&self, path: &Path, remote: &str, branch: &str) -> Result<()> {
        self.sync(path, &["push", remote, branch], remote, branch)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::{ExitStatus, MockProcessRunner};
    use chrono::TimeZone;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_test_runner() -> (GitCommandRunner, MockProcessRunner) {
        let mock = MockProcessRunner::new();
        let runner = GitCommandRunner::new(Arc::new(mock.clone()) as Arc<dyn ProcessRunner>);
        (runner, mock)
    }

    fn output(success: bool, stdout: &str, stderr: &str) -> ProcessOutput {
        ProcessOutput {
            status: if success {
                ExitStatus::Success
            } else {
                ExitStatus::Error(128)
            },
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            duration: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_is_repository_success() {
        let (git, mock) = create_test_runner();
        let temp_dir = TempDir::new().unwrap();

        mock.add_response("git", Ok(output(true, ".git", ""))).await;

        assert!(git.is_repository(temp_dir.path()).await.unwrap());

        let calls = mock.get_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "git");
        assert_eq!(calls[0].args, vec!["rev-parse", "--git-dir"]);
    }

    #[tokio::test]
    async fn test_is_repository_failure() {
        let (git, mock) = create_test_runner();
        let temp_dir = TempDir::new().unwrap();

        mock.add_response(
            "git",
            Ok(output(false, "", "fatal: not a git repository")),
        )
        .await;

        assert!(!git.is_repository(temp_dir.path()).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_current_branch_detached_head() {
        let (git, mock) = create_test_runner();
        let temp_dir = TempDir::new().unwrap();

        mock.add_response("git", Ok(output(true, "\n", ""))).await;

        let err = git.get_current_branch(temp_dir.path()).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<GitError>(),
            Some(&GitError::DetachedHead)
        );
    }

    #[tokio::test]
    async fn test_recent_log_arguments() {
        let (git, mut mock) = create_test_runner();
        let temp_dir = TempDir::new().unwrap();

        mock.expect_command("git")
            .with_args(|args| args.first().map(String::as_str) == Some("log"))
            .returns_stdout(
                "abc1234567890abcdef1234567890abcdef123456 2024-01-01T09:15:00+02:00\n",
            )
            .finish();

        let entries = git.recent_log(temp_dir.path(), 5000).await.unwrap();
        assert_eq!(entries.len(), 1);

        let calls = mock.get_call_history();
        assert_eq!(
            calls[0].args,
            vec!["log", "--format=%H %aI", "--no-merges", "-n", "5000"]
        );
    }

    #[tokio::test]
    async fn test_recent_log_empty_repository() {
        let (git, mock) = create_test_runner();
        let temp_dir = TempDir::new().unwrap();

        mock.add_response(
            "git",
            Ok(output(
                false,
                "",
                "fatal: your current branch 'main' does not have any commits yet",
            )),
        )
        .await;

        let entries = git.recent_log(temp_dir.path(), 10).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_commit_at_sets_both_dates() {
        let (git, mut mock) = create_test_runner();
        let temp_dir = TempDir::new().unwrap();

        mock.expect_command("git")
            .with_args(|args| args.first().map(String::as_str) == Some("commit"))
            .returns_success()
            .finish();
        mock.expect_command("git")
            .with_args(|args| args.first().map(String::as_str) == Some("rev-parse"))
            .returns_stdout("abc1234567890abcdef1234567890abcdef123456\n")
            .finish();

        let date = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 9, 30, 15)
            .unwrap();
        let commit = git
            .commit_at(temp_dir.path(), "minor update", date)
            .await
            .unwrap();
        assert_eq!(commit.short_hash(), "abc1234");

        let calls = mock.get_call_history();
        assert_eq!(
            calls[0].args,
            vec![
                "commit",
                "-m",
                "minor update",
                "--date",
                "2024-03-01T09:30:15+01:00"
            ]
        );
        assert_eq!(
            calls[0].env.get("GIT_COMMITTER_DATE").map(String::as_str),
            Some("2024-03-01T09:30:15+01:00")
        );
    }

    #[tokio::test]
    async fn test_commit_nothing_to_commit() {
        let (git, mock) = create_test_runner();
        let temp_dir = TempDir::new().unwrap();

        mock.add_response(
            "git",
            Ok(output(false, "nothing to commit, working tree clean", "")),
        )
        .await;

        let date = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
            .unwrap();
        let err = git
            .commit_at(temp_dir.path(), "msg", date)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<GitError>(),
            Some(&GitError::NothingToCommit)
        );
    }

    #[tokio::test]
    async fn test_push_failure_is_sync_error() {
        let (git, mock) = create_test_runner();
        let temp_dir = TempDir::new().unwrap();

        mock.add_response(
            "git",
            Ok(output(false, "", "! [rejected] main -> main (fetch first)\n")),
        )
        .await;

        let err = git
            .push(temp_dir.path(), "origin", "main")
            .await
            .unwrap_err();
        let git_err = err.downcast_ref::<GitError>().unwrap();
        assert!(git_err.is_sync_failure());
        assert!(git_err.to_string().contains("origin/main"));
        assert!(git_err.to_string().contains("rejected"));
    }

    #[tokio::test]
    async fn test_stage_files_skips_empty_list() {
        let (git, mock) = create_test_runner();
        let temp_dir = TempDir::new().unwrap();

        git.stage_files(temp_dir.path(), &[]).await.unwrap();
        assert!(mock.get_calls().await.is_empty());
    }
}
