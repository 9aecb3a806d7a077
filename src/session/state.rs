//! Session lifecycle states

use serde::{Deserialize, Serialize};

/// Where a run is in its lifecycle.
///
/// `Idle -> Running -> {Completed, Cancelled, Failed}`; terminal states are
/// never left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Admitted but no slot processed yet
    Idle,
    Running { completed: usize, total: usize },
    Completed { commits: usize },
    Cancelled { commits: usize },
    Failed { commits: usize, error: String },
}

impl SessionState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed { .. }
                | SessionState::Cancelled { .. }
                | SessionState::Failed { .. }
        )
    }

    /// Whether the session still holds the working tree
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Running { .. } => "running",
            SessionState::Completed { .. } => "completed",
            SessionState::Cancelled { .. } => "cancelled",
            SessionState::Failed { .. } => "failed",
        }
    }
}
