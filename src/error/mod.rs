use thiserror::Error;

pub mod codes;

pub use codes::ErrorCode;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// The unified error type for the Cadence library and CLI
///
/// Module errors (`ScheduleError`, `GitError`, `SessionError`, `ProcessError`)
/// convert into this type; the variant decides the process exit code.
#[derive(Error, Debug)]
pub enum CadenceError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Session error: {message}")]
    Session {
        code: u16,
        message: String,
        session_id: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Execution error: {message}")]
    Execution {
        code: u16,
        message: String,
        command: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Git {operation} failed: {message}")]
    Git {
        code: u16,
        message: String,
        operation: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Validation error: {message}")]
    Validation {
        code: u16,
        message: String,
        field: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] {message}")]
    Other {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl CadenceError {
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn session_with_code(
        code: u16,
        message: impl Into<String>,
        session_id: Option<String>,
    ) -> Self {
        Self::Session {
            code,
            message: message.into(),
            session_id,
            source: None,
        }
    }

    pub fn execution_with_code(
        code: u16,
        message: impl Into<String>,
        command: Option<String>,
    ) -> Self {
        Self::Execution {
            code,
            message: message.into(),
            command,
            source: None,
        }
    }

    pub fn git(code: u16, message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Git {
            code,
            message: message.into(),
            operation: operation.into(),
            source: None,
        }
    }

    pub fn validation_with_code(
        code: u16,
        message: impl Into<String>,
        field: Option<String>,
    ) -> Self {
        Self::Validation {
            code,
            message: message.into(),
            field,
            source: None,
        }
    }

    /// Attach the underlying error
    pub fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Session { source: src, .. }
            | Self::Execution { source: src, .. }
            | Self::Git { source: src, .. }
            | Self::Validation { source: src, .. }
            | Self::Other { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Session { .. } => 3,
            Self::Execution { .. } => 5,
            Self::Git { .. } => 7,
            Self::Validation { .. } => 8,
            Self::Other { .. } => 1,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Session { code, .. }
            | Self::Execution { code, .. }
            | Self::Git { code, .. }
            | Self::Validation { code, .. }
            | Self::Other { code, .. } => *code,
        }
    }
}

pub type Result<T> = std::result::Result<T, CadenceError>;

impl From<std::io::Error> for CadenceError {
    fn from(err: std::io::Error) -> Self {
        CadenceError::Other {
            code: ErrorCode::OTHER_IO,
            message: err.to_string(),
            source: None,
        }
        .with_source(err)
    }
}

impl From<serde_json::Error> for CadenceError {
    fn from(err: serde_json::Error) -> Self {
        CadenceError::config_with_code(ErrorCode::CONFIG_PARSE_ERROR, "Invalid JSON").with_source(err)
    }
}

impl From<toml::de::Error> for CadenceError {
    fn from(err: toml::de::Error) -> Self {
        CadenceError::config_with_code(ErrorCode::CONFIG_PARSE_ERROR, "Invalid TOML").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_session_error_keeps_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "last-run.json");
        let err = CadenceError::session_with_code(
            ErrorCode::SESSION_LEDGER,
            "Cannot read ledger",
            None,
        )
        .with_source(io_err);

        assert_eq!(err.code(), ErrorCode::SESSION_LEDGER);
        assert_eq!(err.to_string(), "[E2003] Session error: Cannot read ledger");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("last-run.json"));
    }

    #[test]
    fn test_exit_codes_by_category() {
        let err = CadenceError::config_with_code(ErrorCode::CONFIG_INVALID_RANGE, "bad range");
        assert_eq!(err.exit_code(), 2);

        let err = CadenceError::git(ErrorCode::GIT_NOT_REPO, "no repo", "open");
        assert_eq!(err.exit_code(), 7);
        assert_eq!(err.to_string(), "[E6001] Git open failed: no repo");

        let err = CadenceError::validation_with_code(ErrorCode::VALIDATION_RISKY, "risky", None);
        assert_eq!(err.exit_code(), 8);
    }

    #[test]
    fn test_io_error_maps_to_other() {
        let err = CadenceError::from(std::io::Error::other("disk full"));
        assert_eq!(err.code(), ErrorCode::OTHER_IO);
        assert_eq!(err.exit_code(), 1);
    }
}
