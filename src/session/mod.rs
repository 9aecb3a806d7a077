//! Execution sessions and the single-admission gate
//!
//! A session is one run of a commit plan. Its id is stamped into every commit
//! it creates. [`SessionRegistry`] makes sure at most one session holds the
//! working tree at a time.

pub mod registry;
pub mod state;

pub use registry::{AdmissionGuard, SessionRegistry};
pub use state::SessionState;

use crate::error::{CadenceError, ErrorCode};
use crate::plan::PlannedCommit;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for a session: `session_<unix-millis>_<8 alphanumerics>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Mint a new session ID
    pub fn new() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(8)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        Self(format!("session_{millis}_{suffix}"))
    }

    /// Create from an existing string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The line appended to every commit message of this session
    pub fn trailer(&self) -> String {
        format!("[session:{}]", self.0)
    }

    /// `message` followed by a blank line and the session trailer
    pub fn stamp(&self, message: &str) -> String {
        format!("{message}\n\n{}", self.trailer())
    }

    /// Session id recorded in a commit message's trailer, if any
    pub fn from_message(message: &str) -> Option<Self> {
        let line = message.trim_end().lines().last()?.trim();
        let id = line.strip_prefix("[session:")?.strip_suffix(']')?;
        (!id.is_empty()).then(|| Self::from_string(id))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Admission and cancellation failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session {active} is already running")]
    Busy { active: SessionId },

    #[error("No session is running")]
    NotActive,
}

impl From<SessionError> for CadenceError {
    fn from(err: SessionError) -> Self {
        let (code, session_id) = match &err {
            SessionError::Busy { active } => (ErrorCode::SESSION_BUSY, Some(active.to_string())),
            SessionError::NotActive => (ErrorCode::SESSION_NOT_ACTIVE, None),
        };
        CadenceError::session_with_code(code, err.to_string(), session_id).with_source(err)
    }
}

/// A run waiting to be executed: its id and the commits it will create
#[derive(Debug, Clone)]
pub struct ExecutionSession {
    pub id: SessionId,
    pub commits: Vec<PlannedCommit>,
}

impl ExecutionSession {
    pub fn new(commits: Vec<PlannedCommit>) -> Self {
        Self {
            id: SessionId::new(),
            commits,
        }
    }

    pub fn with_id(id: SessionId, commits: Vec<PlannedCommit>) -> Self {
        Self { id, commits }
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_format() {
        let id = SessionId::new();
        let parts: Vec<&str> = id.as_str().split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_stamp_and_parse_trailer() {
        let id = SessionId::from_string("session_1_abcdefgh");
        let message = id.stamp("fix typo");

        assert_eq!(message, "fix typo\n\n[session:session_1_abcdefgh]");
        assert_eq!(SessionId::from_message(&message), Some(id));
        assert_eq!(SessionId::from_message("fix typo"), None);
        assert_eq!(SessionId::from_message("x\n\n[session:]"), None);
    }

    #[test]
    fn test_busy_error_code() {
        let err: CadenceError = SessionError::Busy {
            active: SessionId::from_string("session_1_a"),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::SESSION_BUSY);
        assert!(err.to_string().contains("session_1_a"));
    }
}
