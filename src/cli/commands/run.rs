//! Run command implementation
//!
//! Builds the commit plan, checks it, snapshots HEAD into the run ledger and
//! hands the session to an [`ExecutionController`]. Ctrl-C asks the run to
//! stop after the commit in flight.

use super::{resolve_distribution, CommandContext};
use crate::cli::display::{self, RunProgress};
use crate::error::{CadenceError, ErrorCode};
use crate::execution::{ExecutionController, RunHandle, RunOutcome, RunResult};
use crate::git::GitError;
use crate::inspect::{inspect_repository, query_blocking};
use crate::ledger::{RunLedger, RunRecord};
use crate::plan::build_plan;
use crate::repository::{DryRunRepository, GitRepository, Repository};
use crate::schedule;
use crate::session::ExecutionSession;
use crate::validation::{validate_run_config, RunRequest};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    pub dry_run: bool,
    pub auto_push: bool,
    pub allow_dirty: bool,
    pub yes: bool,
}

pub async fn run_run_command(ctx: &CommandContext, flags: RunFlags) -> Result<()> {
    let git_repository = Arc::new(GitRepository::open(&ctx.repo).await?);
    let inspection = query_blocking(&ctx.repo, inspect_repository).await?;

    let schedule_config = resolve_distribution(
        ctx.schedule_config(),
        &ctx.analyzer(),
        Some(git_repository.as_ref() as &dyn Repository),
    )
    .await;
    let mut sync = ctx.config.sync_options(inspection.branch.as_deref());
    sync.auto_push = (sync.auto_push || flags.auto_push) && !flags.dry_run;

    let report = validate_run_config(
        &RunRequest {
            repo_path: Some(ctx.repo.as_path()),
            start_date: Some(schedule_config.start_date),
            end_date: Some(schedule_config.end_date),
            commits_per_day: schedule_config.commits_per_day,
            messages: &ctx.config.commits,
            checked_out: inspection.branch.as_deref(),
            branch: &sync.branch,
            auto_push: sync.auto_push,
            use_distribution: schedule_config.use_distribution,
            has_distribution: schedule_config.distribution.is_some(),
        },
        ctx.today(),
    );
    display::print_validation(&report);
    if !report.is_valid() {
        return Err(CadenceError::validation_with_code(
            ErrorCode::VALIDATION_FAILED,
            format!("{} problem(s) in the run configuration", report.errors.len()),
            None,
        )
        .into());
    }

    if !flags.dry_run {
        if report.risky && !flags.yes {
            return Err(CadenceError::validation_with_code(
                ErrorCode::VALIDATION_RISKY,
                "This schedule looks automated; re-run with --yes to accept it",
                Some("commits_per_day".to_string()),
            )
            .into());
        }
        if inspection.is_dirty() && !flags.allow_dirty {
            return Err(GitError::DirtyWorkingTree(inspection.uncommitted).into());
        }
    }

    let schedule = schedule::generate(schedule_config.clone()).map_err(CadenceError::from)?;
    let plan = build_plan(&schedule.slots, &ctx.config.commits, schedule_config.seed);
    let session = ExecutionSession::new(plan);
    info!(
        "Planned {} commits over {} days (seed {})",
        session.len(),
        schedule.stats.total_days,
        schedule_config.seed
    );

    let target = if flags.dry_run {
        Arc::new(DryRunRepository::new()) as Arc<dyn Repository>
    } else {
        git_repository.clone() as Arc<dyn Repository>
    };

    let mut record = None;
    if !flags.dry_run {
        let ledger = RunLedger::for_repository(&ctx.repo).await?;
        let previous_head = git_repository.head_commit_id().await?;
        let pending = RunRecord::new(session.id.clone(), inspection.branch.clone(), previous_head);
        ledger.save(&pending).await?;
        record = Some((ledger, pending));
    }

    let controller = ExecutionController::new(target);
    let total = session.len();
    let handle = controller.start(session, sync)?;
    let result = watch(handle, RunProgress::new(total, flags.dry_run)).await?;

    if let Some((ledger, mut pending)) = record {
        pending.complete(&result);
        ledger.save(&pending).await?;
    }

    display::print_result(&result, flags.dry_run);
    match result.outcome {
        RunOutcome::Failed => Err(CadenceError::execution_with_code(
            ErrorCode::EXEC_RUN_ABORTED,
            result
                .error
                .clone()
                .unwrap_or_else(|| "run failed".to_string()),
            None,
        )
        .into()),
        RunOutcome::Completed | RunOutcome::Cancelled => Ok(()),
    }
}

/// Drive the progress bar until the run ends, cancelling on Ctrl-C
async fn watch(
    mut handle: RunHandle,
    progress: RunProgress,
) -> Result<RunResult, CadenceError> {
    let mut listening = true;
    loop {
        tokio::select! {
            update = handle.next_progress() => match update {
                Some(update) => progress.update(&update),
                None => break,
            },
            signal = tokio::signal::ctrl_c(), if listening => {
                listening = false;
                if signal.is_ok() {
                    debug!("Interrupt received, cancelling {}", handle.session_id());
                    progress.cancelling();
                    handle.cancel();
                }
            }
        }
    }

    let result = handle.wait().await?;
    progress.finish(&result);
    Ok(result)
}
