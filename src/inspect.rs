//! Read-only repository inspection through libgit2

use crate::git::{CommitId, GitError};
use crate::session::SessionId;
use anyhow::{Context, Result};
use git2::{BranchType, ErrorCode, Repository, Sort, StatusOptions};
use serde::Serialize;
use std::path::Path;

/// What a run needs to know about a repository before it starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoInspection {
    /// `None` when HEAD is detached
    pub branch: Option<String>,
    pub remote_name: Option<String>,
    pub remote_url: Option<String>,
    /// Modified, staged or untracked paths
    pub uncommitted: usize,
    pub local_branches: Vec<String>,
}

impl RepoInspection {
    pub fn has_remote(&self) -> bool {
        self.remote_name.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.uncommitted > 0
    }
}

/// Run a libgit2 query against `path` on the blocking thread pool
pub async fn query_blocking<T, F>(path: &Path, query: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || query(&path))
        .await
        .context("Repository query panicked")?
}

fn open(path: &Path) -> Result<Repository> {
    Repository::open(path)
        .map_err(|_| GitError::NotARepository(path.display().to_string()).into())
}

/// Inspect the repository at `path`
pub fn inspect_repository(path: &Path) -> Result<RepoInspection> {
    let repo = open(path)?;

    let (remote_name, remote_url) = first_remote(&repo)?;
    let mut local_branches = Vec::new();
    for branch in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = branch?;
        if let Some(name) = branch.name()? {
            local_branches.push(name.to_string());
        }
    }
    local_branches.sort();

    Ok(RepoInspection {
        branch: current_branch(&repo)?,
        remote_name,
        remote_url,
        uncommitted: uncommitted_count(&repo)?,
        local_branches,
    })
}

fn current_branch(repo: &Repository) -> Result<Option<String>> {
    match repo.head() {
        Ok(head) if head.is_branch() => Ok(head.shorthand().map(str::to_string)),
        Ok(_) => Ok(None),
        // A fresh repository: HEAD points at a branch with no commits yet
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            let head = repo.find_reference("HEAD")?;
            Ok(head
                .symbolic_target()
                .and_then(|target| target.strip_prefix("refs/heads/"))
                .map(str::to_string))
        }
        Err(e) => Err(e).context("Failed to read HEAD"),
    }
}

fn first_remote(repo: &Repository) -> Result<(Option<String>, Option<String>)> {
    let remotes = repo.remotes()?;
    let Some(name) = remotes.iter().flatten().next() else {
        return Ok((None, None));
    };
    let remote = repo.find_remote(name)?;
    Ok((Some(name.to_string()), remote.url().map(str::to_string)))
}

fn uncommitted_count(repo: &Repository) -> Result<usize> {
    let mut options = StatusOptions::new();
    options
        .include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);
    let statuses = repo
        .statuses(Some(&mut options))
        .context("Failed to read working tree status")?;
    Ok(statuses
        .iter()
        .filter(|entry| !entry.status().is_ignored())
        .count())
}

/// Commits reachable from HEAD whose message carries `session`'s trailer.
///
/// Looks at most `limit` commits back, newest first.
pub fn session_commits(path: &Path, session: &SessionId, limit: usize) -> Result<Vec<CommitId>> {
    let repo = open(path)?;
    if let Err(e) = repo.head() {
        return match e.code() {
            ErrorCode::UnbornBranch | ErrorCode::NotFound => Ok(Vec::new()),
            _ => Err(e).context("Failed to read HEAD"),
        };
    }
    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TIME)?;
    walk.push_head()?;

    let mut found = Vec::new();
    for oid in walk.take(limit) {
        let commit = repo.find_commit(oid?)?;
        let matches = commit
            .message()
            .and_then(SessionId::from_message)
            .is_some_and(|id| &id == session);
        if matches {
            found.push(CommitId::new(commit.id().to_string()));
        }
    }
    Ok(found)
}
