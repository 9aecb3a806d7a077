//! Record of the last run, kept inside the repository's git directory
//!
//! Before a real run the CLI stores the pre-run HEAD here so `cadence undo`
//! can put the branch back where it was.

use crate::execution::{RunOutcome, RunResult};
use crate::git::{CommitId, GitError};
use crate::session::SessionId;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const LEDGER_FILE: &str = "last-run.json";

/// What one run changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub branch: Option<String>,
    /// `None` when the repository had no commits before the run
    pub previous_head: Option<CommitId>,
    #[serde(default)]
    pub commits: Vec<CommitId>,
    /// Unset while the run is still in progress
    #[serde(default)]
    pub outcome: Option<RunOutcome>,
}

impl RunRecord {
    pub fn new(session_id: SessionId, branch: Option<String>, previous_head: Option<CommitId>) -> Self {
        Self {
            session_id,
            started_at: Utc::now(),
            branch,
            previous_head,
            commits: Vec::new(),
            outcome: None,
        }
    }

    /// Fill in the commits and outcome of a finished run
    pub fn complete(&mut self, result: &RunResult) {
        self.commits = result.commits.iter().map(|c| c.hash.clone()).collect();
        self.outcome = Some(result.outcome);
    }
}

/// JSON file holding the most recent [`RunRecord`]
pub struct RunLedger {
    dir: PathBuf,
}

impl RunLedger {
    /// Ledger stored in `dir`
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Ledger under `<git-dir>/cadence` of the repository at `root`
    pub async fn for_repository(root: &Path) -> Result<Self> {
        let root = root.to_path_buf();
        let git_dir = tokio::task::spawn_blocking(move || {
            git2::Repository::open(&root)
                .map(|repo| repo.path().to_path_buf())
                .map_err(|_| GitError::NotARepository(root.display().to_string()))
        })
        .await
        .context("Git directory lookup panicked")??;
        Ok(Self::at(git_dir.join("cadence")))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(LEDGER_FILE)
    }

    /// The recorded run, if any
    pub async fn load(&self) -> Result<Option<RunRecord>> {
        let path = self.path();
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read run ledger {}", path.display()))
            }
        };
        let record = serde_json::from_str(&contents)
            .with_context(|| format!("Run ledger {} is corrupted", path.display()))?;
        Ok(Some(record))
    }

    /// Replace the recorded run
    pub async fn save(&self, record: &RunRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .context("Failed to create ledger directory")?;

        let temp_file = self.dir.join(format!("{LEDGER_FILE}.tmp"));
        let json = serde_json::to_string_pretty(record).context("Failed to serialize run record")?;
        fs::write(&temp_file, json)
            .await
            .context("Failed to write temp ledger file")?;
        fs::rename(&temp_file, self.path())
            .await
            .context("Failed to rename ledger file")?;

        tracing::debug!("Recorded run {} in {}", record.session_id, self.path().display());
        Ok(())
    }

    /// Forget the recorded run; a missing ledger is fine
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(self.path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove run ledger"),
        }
    }
}
