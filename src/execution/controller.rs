//! Single-flight execution of commit plans

use super::{AppliedCommit, ProgressUpdate, RunOutcome, RunResult, SyncOptions};
use crate::analysis::{HistoryAnalysis, HistoryAnalyzer};
use crate::error::{CadenceError, ErrorCode};
use crate::git::CommitId;
use crate::plan::PlannedCommit;
use crate::repository::Repository;
use crate::session::{AdmissionGuard, ExecutionSession, SessionError, SessionId, SessionRegistry};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives sessions against one repository, one at a time
pub struct ExecutionController {
    repository: Arc<dyn Repository>,
    registry: SessionRegistry,
    analyzer: HistoryAnalyzer,
}

impl ExecutionController {
    /// Controller gated by the process-wide registry of the repository's
    /// working tree
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        let registry = SessionRegistry::for_working_tree(&repository.working_tree());
        Self::with_registry(repository, registry)
    }

    /// Share an existing registry, e.g. to cancel from another component
    pub fn with_registry(repository: Arc<dyn Repository>, registry: SessionRegistry) -> Self {
        Self {
            repository,
            registry,
            analyzer: HistoryAnalyzer::new(),
        }
    }

    pub fn with_analyzer(mut self, analyzer: HistoryAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Admit `session` and start it on a background task.
    ///
    /// Fails with [`SessionError::Busy`] without touching the repository when
    /// another session is active.
    pub fn start(
        &self,
        session: ExecutionSession,
        sync: SyncOptions,
    ) -> Result<RunHandle, SessionError> {
        let cancel = CancellationToken::new();
        let guard = self.registry.admit(&session.id, cancel.clone())?;
        let (progress_tx, progress_rx) = unbounded_channel();

        let session_id = session.id.clone();
        let repository = Arc::clone(&self.repository);
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let result = run_session(repository.as_ref(), &session, &sync, &token, &progress_tx, &guard).await;
            guard.finish(result.session_state());
            result
        });

        Ok(RunHandle {
            session_id,
            cancel,
            progress: progress_rx,
            task,
        })
    }

    /// Start `session` and wait for its result, ignoring progress
    pub async fn run(
        &self,
        session: ExecutionSession,
        sync: SyncOptions,
    ) -> Result<RunResult, CadenceError> {
        self.start(session, sync)?.wait().await
    }

    /// Request cooperative cancellation of the active session
    pub fn cancel_active(&self) -> Result<SessionId, SessionError> {
        self.registry.cancel_active()
    }

    /// Analyze commit history; rejected while a session is running
    pub async fn analyze_history(&self) -> Result<HistoryAnalysis> {
        self.registry.ensure_idle()?;
        self.analyzer.analyze(self.repository.as_ref()).await
    }
}

/// Caller's side of a started run
pub struct RunHandle {
    session_id: SessionId,
    cancel: CancellationToken,
    progress: UnboundedReceiver<ProgressUpdate>,
    task: JoinHandle<RunResult>,
}

impl RunHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Ask the run to stop before its next slot
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Next progress update; `None` once the run has ended
    pub async fn next_progress(&mut self) -> Option<ProgressUpdate> {
        self.progress.recv().await
    }

    /// Wait for the run to reach a terminal state
    pub async fn wait(self) -> Result<RunResult, CadenceError> {
        self.task.await.map_err(|e| {
            CadenceError::execution_with_code(
                ErrorCode::EXEC_RUN_ABORTED,
                format!("Run {} did not finish: {e}", self.session_id),
                None,
            )
        })
    }
}

async fn run_session(
    repository: &dyn Repository,
    session: &ExecutionSession,
    sync: &SyncOptions,
    cancel: &CancellationToken,
    progress: &UnboundedSender<ProgressUpdate>,
    guard: &AdmissionGuard,
) -> RunResult {
    let total = session.len();
    let mut commits = Vec::with_capacity(total);
    info!("Session {} started: {} commits planned", session.id, total);
    guard.progress(0, total);

    for (index, planned) in session.commits.iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }

        let hash = match apply_commit(repository, &session.id, planned).await {
            Ok(hash) => hash,
            Err(err) => {
                error!(
                    "Session {} failed at commit {} of {}: {:#}",
                    session.id,
                    index + 1,
                    total,
                    err
                );
                let mut result = RunResult::new(session.id.clone(), RunOutcome::Failed, commits);
                result.error = Some(format!("{err:#}"));
                return result;
            }
        };

        debug!("Created {} for {}", hash.short_hash(), planned.slot.timestamp);
        commits.push(AppliedCommit {
            hash: hash.clone(),
            message: planned.message.clone(),
            date: planned.slot.timestamp,
            file: planned.file.clone(),
            session_id: session.id.clone(),
        });
        guard.progress(commits.len(), total);

        // A dropped receiver only means nobody is watching.
        let _ = progress.send(ProgressUpdate {
            session_id: session.id.clone(),
            current: commits.len(),
            total,
            label: planned.label(),
            commit: hash,
        });
    }

    if cancel.is_cancelled() {
        info!(
            "Session {} cancelled after {} of {} commits",
            session.id,
            commits.len(),
            total
        );
        return RunResult::new(session.id.clone(), RunOutcome::Cancelled, commits);
    }

    let mut result = RunResult::new(session.id.clone(), RunOutcome::Completed, commits);
    if sync.auto_push {
        if let Err(err) = synchronize(repository, sync).await {
            warn!("Session {}: commits kept locally, sync failed: {:#}", session.id, err);
            result.push_error = Some(format!("{err:#}"));
        }
    }

    info!(
        "Session {} completed with {} commits",
        session.id,
        result.commits.len()
    );
    result
}

async fn apply_commit(
    repository: &dyn Repository,
    session_id: &SessionId,
    planned: &PlannedCommit,
) -> Result<CommitId> {
    repository.write_file(&planned.file, &planned.content).await?;
    repository.stage(&planned.file).await?;
    repository
        .commit(&session_id.stamp(&planned.message), planned.slot.timestamp)
        .await
}

async fn synchronize(repository: &dyn Repository, sync: &SyncOptions) -> Result<()> {
    repository.pull_rebase(&sync.remote, &sync.branch).await?;
    repository.push(&sync.remote, &sync.branch).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{build_plan, MessageOptions};
    use crate::schedule::{generate, ScheduleConfig, TimeWindow};
    use crate::session::SessionState;
    use crate::testing::{log_entry, MockRepository};
    use chrono::NaiveDate;

    fn plan(days: u32, per_day: u32) -> Vec<PlannedCommit> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = start + chrono::Days::new(u64::from(days) - 1);
        let config = ScheduleConfig::new(start, end)
            .with_commits_per_day(per_day)
            .with_time_window(TimeWindow::Morning);
        let schedule = generate(config).unwrap();
        build_plan(&schedule.slots, &MessageOptions::default(), 12345)
    }

    fn push_sync() -> SyncOptions {
        SyncOptions {
            auto_push: true,
            ..SyncOptions::default()
        }
    }

    #[tokio::test]
    async fn test_completed_run_applies_every_slot_in_order() {
        let repo = Arc::new(MockRepository::new());
        let controller = ExecutionController::new(repo.clone());
        let planned = plan(3, 2);

        let result = controller
            .run(ExecutionSession::new(planned.clone()), SyncOptions::default())
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.commits.len(), 6);
        assert_eq!(result.push_error, None);
        assert_eq!(repo.push_attempts(), 0);

        let recorded = repo.commits();
        for ((applied, recorded), planned) in result.commits.iter().zip(&recorded).zip(&planned) {
            assert_eq!(applied.hash, recorded.id);
            assert_eq!(recorded.authored, planned.slot.timestamp);
            assert_eq!(recorded.files, vec![planned.file.clone()]);
            assert_eq!(
                recorded.message,
                format!("{}\n\n[session:{}]", planned.message, result.session_id)
            );
            assert_eq!(applied.session_id, result.session_id);
        }
        assert_eq!(&repo.calls()[..3], ["write activity.txt", "stage activity.txt", "commit"]);
    }

    #[tokio::test]
    async fn test_cancel_after_three_of_five() {
        let registry = SessionRegistry::new();
        let repo = Arc::new(MockRepository::new().cancel_after(3, registry.clone()));
        let controller = ExecutionController::with_registry(repo.clone(), registry);
        let planned: Vec<PlannedCommit> = plan(5, 1);
        assert_eq!(planned.len(), 5);

        let result = controller
            .run(ExecutionSession::new(planned), push_sync())
            .await
            .unwrap();

        assert!(result.cancelled());
        assert_eq!(result.commits.len(), 3);
        assert_eq!(repo.commits().len(), 3);
        assert_eq!(repo.calls().iter().filter(|c| *c == "commit").count(), 3);
        assert_eq!(repo.push_attempts(), 0);
        assert_eq!(
            controller.registry().state(&result.session_id),
            Some(SessionState::Cancelled { commits: 3 })
        );
    }

    #[tokio::test]
    async fn test_push_failure_is_a_warning() {
        let repo = Arc::new(MockRepository::new().fail_push("! [rejected] main -> main"));
        let controller = ExecutionController::new(repo.clone());

        let result = controller
            .run(ExecutionSession::new(plan(2, 2)), push_sync())
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.commits.len(), 4);
        assert!(result.push_error.as_deref().unwrap().contains("rejected"));
        assert_eq!(repo.pull_attempts(), 1);
        assert_eq!(repo.calls().last().unwrap(), "push origin main");
    }

    #[tokio::test]
    async fn test_pull_failure_skips_push() {
        let repo = Arc::new(MockRepository::new().fail_pull("conflict"));
        let controller = ExecutionController::new(repo.clone());

        let result = controller
            .run(ExecutionSession::new(plan(1, 1)), push_sync())
            .await
            .unwrap();

        assert!(result.success());
        assert!(result.push_error.is_some());
        assert_eq!(repo.push_attempts(), 0);
    }

    #[tokio::test]
    async fn test_repository_failure_keeps_earlier_commits() {
        let repo = Arc::new(MockRepository::new().fail_commit_at(3));
        let controller = ExecutionController::new(repo.clone());

        let result = controller
            .run(ExecutionSession::new(plan(5, 1)), push_sync())
            .await
            .unwrap();

        assert_eq!(result.outcome, RunOutcome::Failed);
        assert_eq!(result.commits.len(), 2);
        assert!(result.error.as_deref().unwrap().contains("commit 3"));
        assert_eq!(repo.calls().iter().filter(|c| *c == "commit").count(), 3);
        assert_eq!(repo.push_attempts(), 0);
        assert_eq!(repo.pull_attempts(), 0);
    }

    #[tokio::test]
    async fn test_second_start_is_rejected_while_running() {
        let repo = Arc::new(MockRepository::new());
        let controller = ExecutionController::new(repo.clone());

        let first = controller
            .start(ExecutionSession::new(plan(2, 1)), SyncOptions::default())
            .unwrap();
        let err = controller
            .start(ExecutionSession::new(plan(2, 1)), SyncOptions::default())
            .err()
            .unwrap();
        assert_eq!(
            err,
            SessionError::Busy {
                active: first.session_id().clone()
            }
        );

        let result = first.wait().await.unwrap();
        assert_eq!(result.commits.len(), 2);
        assert_eq!(repo.commits().len(), 2);

        let again = controller
            .run(ExecutionSession::new(plan(1, 1)), SyncOptions::default())
            .await
            .unwrap();
        assert!(again.success());
    }

    #[tokio::test]
    async fn test_progress_reports_every_commit() {
        let repo = Arc::new(MockRepository::new());
        let controller = ExecutionController::new(repo);
        let planned = plan(2, 2);

        let mut handle = controller
            .start(ExecutionSession::new(planned.clone()), SyncOptions::default())
            .unwrap();
        let mut updates = Vec::new();
        while let Some(update) = handle.next_progress().await {
            updates.push(update);
        }
        let result = handle.wait().await.unwrap();

        assert_eq!(updates.len(), 4);
        for (i, update) in updates.iter().enumerate() {
            assert_eq!(update.current, i + 1);
            assert_eq!(update.total, 4);
            assert_eq!(update.label, planned[i].label());
            assert_eq!(update.commit, result.commits[i].hash);
        }
    }

    #[tokio::test]
    async fn test_cancel_before_first_slot() {
        let repo = Arc::new(MockRepository::new());
        let controller = ExecutionController::new(repo.clone());

        let handle = controller
            .start(ExecutionSession::new(plan(3, 1)), push_sync())
            .unwrap();
        handle.cancel();
        let result = handle.wait().await.unwrap();

        assert!(result.cancelled());
        assert!(result.commits.is_empty());
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_without_active_session() {
        let controller = ExecutionController::new(Arc::new(MockRepository::new()));
        assert_eq!(controller.cancel_active(), Err(SessionError::NotActive));
    }

    #[tokio::test]
    async fn test_analysis_rejected_while_running() {
        let repo = Arc::new(
            MockRepository::new().with_log(vec![log_entry(1, "2024-01-01T09:00:00+00:00")]),
        );
        let controller = ExecutionController::new(repo.clone());

        let handle = controller
            .start(ExecutionSession::new(plan(1, 1)), SyncOptions::default())
            .unwrap();
        let err = controller.analyze_history().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::Busy { .. })
        ));
        assert!(!repo.calls().iter().any(|c| c.starts_with("log")));

        handle.wait().await.unwrap();
        let analysis = controller.analyze_history().await.unwrap();
        assert_eq!(analysis.total_analyzed, 1);
        assert_eq!(analysis.distribution.hours[9], 1);
    }

    #[tokio::test]
    async fn test_controllers_on_one_working_tree_share_the_gate() {
        let repo = Arc::new(MockRepository::new());
        let first = ExecutionController::new(repo.clone());
        let second = ExecutionController::new(repo.clone());

        let handle = first
            .start(ExecutionSession::new(plan(2, 1)), SyncOptions::default())
            .unwrap();
        let err = second
            .start(ExecutionSession::new(plan(2, 1)), SyncOptions::default())
            .err()
            .unwrap();
        assert_eq!(
            err,
            SessionError::Busy {
                active: handle.session_id().clone()
            }
        );
        assert!(second.analyze_history().await.is_err());

        let elsewhere = ExecutionController::new(Arc::new(MockRepository::new()));
        assert!(!elsewhere.registry().is_busy());

        let result = handle.wait().await.unwrap();
        assert_eq!(result.commits.len(), 2);
        assert_eq!(repo.commits().len(), 2);
        assert!(!second.registry().is_busy());
    }
}
