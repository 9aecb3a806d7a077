//! Undo command implementation

use super::CommandContext;
use crate::error::{CadenceError, ErrorCode};
use crate::git::CommitId;
use crate::ledger::RunLedger;
use crate::repository::{GitRepository, Repository};
use anyhow::Result;
use tracing::info;

/// Hard-reset to the commit recorded before the last run, or to `to`
pub async fn run_undo_command(ctx: &CommandContext, to: Option<String>) -> Result<()> {
    let ledger = RunLedger::for_repository(&ctx.repo).await?;
    let record = ledger.load().await?;

    let target = match (to, &record) {
        (Some(hash), _) => CommitId::new(hash),
        (None, Some(record)) => record.previous_head.clone().ok_or_else(|| {
            CadenceError::session_with_code(
                ErrorCode::SESSION_LEDGER,
                "The last run started from an empty repository; pass --to <hash>",
                Some(record.session_id.to_string()),
            )
        })?,
        (None, None) => {
            return Err(CadenceError::session_with_code(
                ErrorCode::SESSION_LEDGER,
                "No run recorded for this repository; pass --to <hash>",
                None,
            )
            .into())
        }
    };

    let repository = GitRepository::open(&ctx.repo).await?;
    repository.reset_hard(&target).await?;
    ledger.clear().await?;

    info!("Reset {} to {}", ctx.repo.display(), target);
    println!("↩️  Reset to {}", target.short_hash());
    Ok(())
}
