//! Process-wide single-admission gate

use super::{SessionError, SessionId, SessionState};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

struct ActiveSession {
    id: SessionId,
    cancel: CancellationToken,
}

#[derive(Default)]
struct RegistryInner {
    active: Option<ActiveSession>,
    states: HashMap<SessionId, SessionState>,
}

/// One registry per working tree for the whole process
static WORKING_TREES: Lazy<Mutex<HashMap<String, SessionRegistry>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Admits at most one active session and remembers the state of the active
/// session and of the last finished one.
///
/// Cloning shares the same registry. The lock is never held across an await.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl SessionRegistry {
    /// A standalone registry, shared only through clones
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry every controller in this process uses for `working_tree`
    pub fn for_working_tree(working_tree: &str) -> Self {
        let mut trees = WORKING_TREES
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        trees.entry(working_tree.to_string()).or_default().clone()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit `id` as the active session, or reject it if another one is active
    pub fn admit(
        &self,
        id: &SessionId,
        cancel: CancellationToken,
    ) -> Result<AdmissionGuard, SessionError> {
        let mut inner = self.lock();
        if let Some(active) = &inner.active {
            return Err(SessionError::Busy {
                active: active.id.clone(),
            });
        }
        inner.active = Some(ActiveSession {
            id: id.clone(),
            cancel,
        });
        inner.states.insert(id.clone(), SessionState::Idle);
        debug!("Admitted session {}", id);

        Ok(AdmissionGuard {
            registry: self.clone(),
            id: id.clone(),
            released: false,
        })
    }

    /// Id of the session currently holding the working tree
    pub fn active(&self) -> Option<SessionId> {
        self.lock().active.as_ref().map(|a| a.id.clone())
    }

    pub fn is_busy(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Fail with [`SessionError::Busy`] while a session is active
    pub fn ensure_idle(&self) -> Result<(), SessionError> {
        match self.active() {
            Some(active) => Err(SessionError::Busy { active }),
            None => Ok(()),
        }
    }

    /// Request cooperative cancellation of the active session
    pub fn cancel_active(&self) -> Result<SessionId, SessionError> {
        let inner = self.lock();
        let active = inner.active.as_ref().ok_or(SessionError::NotActive)?;
        active.cancel.cancel();
        debug!("Cancellation requested for session {}", active.id);
        Ok(active.id.clone())
    }

    /// Last recorded state of `id`
    pub fn state(&self, id: &SessionId) -> Option<SessionState> {
        self.lock().states.get(id).cloned()
    }

    fn record(&self, id: &SessionId, state: SessionState) {
        self.lock().states.insert(id.clone(), state);
    }

    fn release(&self, id: &SessionId, state: SessionState) {
        let mut inner = self.lock();
        if inner.active.as_ref().is_some_and(|a| &a.id == id) {
            inner.active = None;
        }
        let active = inner.active.as_ref().map(|a| a.id.clone());
        inner
            .states
            .retain(|tracked, _| Some(tracked) == active.as_ref());
        inner.states.insert(id.clone(), state);
    }
}

/// Held by the running session; releases the gate when finished or dropped
pub struct AdmissionGuard {
    registry: SessionRegistry,
    id: SessionId,
    released: bool,
}

impl AdmissionGuard {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Record that `completed` of `total` commits are done
    pub fn progress(&self, completed: usize, total: usize) {
        self.registry
            .record(&self.id, SessionState::Running { completed, total });
    }

    /// Store the terminal state and open the gate for the next session
    pub fn finish(mut self, state: SessionState) {
        self.registry.release(&self.id, state);
        self.released = true;
    }
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let commits = match self.registry.state(&self.id) {
            Some(SessionState::Running { completed, .. }) => completed,
            _ => 0,
        };
        warn!("Session {} ended without a result", self.id);
        self.registry.release(
            &self.id,
            SessionState::Failed {
                commits,
                error: "run aborted".to_string(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_admission_rejected() {
        let registry = SessionRegistry::new();
        let first = SessionId::from_string("session_1_aaaaaaaa");
        let second = SessionId::from_string("session_2_bbbbbbbb");

        let guard = registry.admit(&first, CancellationToken::new()).unwrap();
        let err = registry
            .admit(&second, CancellationToken::new())
            .err()
            .unwrap();
        assert_eq!(
            err,
            SessionError::Busy {
                active: first.clone()
            }
        );
        assert_eq!(registry.state(&second), None);

        guard.finish(SessionState::Completed { commits: 0 });
        assert!(!registry.is_busy());
        assert!(registry.admit(&second, CancellationToken::new()).is_ok());
    }

    #[test]
    fn test_cancel_requires_active_session() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.cancel_active(), Err(SessionError::NotActive));

        let token = CancellationToken::new();
        let id = SessionId::from_string("session_1_cccccccc");
        let _guard = registry.admit(&id, token.clone()).unwrap();

        assert_eq!(registry.cancel_active(), Ok(id));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_dropped_guard_releases_gate() {
        let registry = SessionRegistry::new();
        let id = SessionId::from_string("session_1_dddddddd");
        {
            let guard = registry.admit(&id, CancellationToken::new()).unwrap();
            guard.progress(2, 5);
        }

        assert!(!registry.is_busy());
        assert_eq!(
            registry.state(&id),
            Some(SessionState::Failed {
                commits: 2,
                error: "run aborted".to_string()
            })
        );
    }

    #[test]
    fn test_ensure_idle() {
        let registry = SessionRegistry::new();
        assert!(registry.ensure_idle().is_ok());
        let id = SessionId::from_string("session_1_eeeeeeee");
        let _guard = registry.admit(&id, CancellationToken::new()).unwrap();
        assert_eq!(registry.ensure_idle(), Err(SessionError::Busy { active: id }));
    }

    #[test]
    fn test_only_the_last_finished_session_is_kept() {
        let registry = SessionRegistry::new();
        let ids: Vec<SessionId> = (0..3)
            .map(|n| SessionId::from_string(format!("session_{n}_ffffffff")))
            .collect();

        for (n, id) in ids.iter().enumerate() {
            let guard = registry.admit(id, CancellationToken::new()).unwrap();
            guard.progress(1, 1);
            guard.finish(SessionState::Completed { commits: n + 1 });
        }

        assert_eq!(registry.lock().states.len(), 1);
        assert_eq!(registry.state(&ids[0]), None);
        assert_eq!(registry.state(&ids[1]), None);
        assert_eq!(
            registry.state(&ids[2]),
            Some(SessionState::Completed { commits: 3 })
        );

        let next = SessionId::from_string("session_9_gggggggg");
        let _guard = registry.admit(&next, CancellationToken::new()).unwrap();
        assert_eq!(registry.lock().states.len(), 2);
    }

    #[test]
    fn test_working_tree_registries_are_shared_per_tree() {
        let first = SessionRegistry::for_working_tree("/tmp/cadence-registry-shared");
        let second = SessionRegistry::for_working_tree("/tmp/cadence-registry-shared");
        let other = SessionRegistry::for_working_tree("/tmp/cadence-registry-other");

        let id = SessionId::from_string("session_1_hhhhhhhh");
        let guard = first.admit(&id, CancellationToken::new()).unwrap();
        assert_eq!(second.active(), Some(id.clone()));
        assert!(!other.is_busy());

        guard.finish(SessionState::Completed { commits: 0 });
        assert!(!second.is_busy());
    }
}
