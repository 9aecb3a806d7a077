use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use super::error::ProcessError;

/// Variables passed through to child processes besides `PATH`
///
/// Everything else is dropped: an inherited `GIT_DIR`, `GIT_INDEX_FILE` or
/// `GIT_COMMITTER_DATE` would redirect commits or override per-commit dates.
const INHERITED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "USER",
    "TMPDIR",
    "LANG",
    "LC_ALL",
    "SSH_AUTH_SOCK",
    "GIT_SSH_COMMAND",
    "GIT_CONFIG_GLOBAL",
    "GIT_CONFIG_NOSYSTEM",
    "GIT_AUTHOR_NAME",
    "GIT_AUTHOR_EMAIL",
    "GIT_COMMITTER_NAME",
    "GIT_COMMITTER_EMAIL",
];

#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl ProcessCommand {
    /// Program and arguments joined for log lines and error messages
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    /// Whether either output stream contains `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.stdout.contains(needle) || self.stderr.contains(needle)
    }

    /// Trimmed stderr, falling back to stdout when stderr is empty
    pub fn error_text(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            ExitStatus::Signal(_) => None,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            return ExitStatus::Success;
        }
        if let Some(code) = status.code() {
            return ExitStatus::Error(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitStatus::Signal(signal);
            }
        }
        ExitStatus::Error(1)
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
}

/// Runs commands as real child processes
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn prepare(command: &ProcessCommand) -> Result<tokio::process::Command, ProcessError> {
        let path = std::env::var("PATH")
            .map_err(|_| ProcessError::MissingEnvironment("PATH".to_string()))?;

        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .env_clear()
            .env("PATH", path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for var in INHERITED_VARS {
            if let Ok(value) = std::env::var(var) {
                cmd.env(var, value);
            }
        }
        cmd.envs(&command.env);

        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }
        Ok(cmd)
    }

    fn log_result(result: &ProcessOutput, command_line: &str) {
        match result.status {
            ExitStatus::Success => {
                tracing::debug!("`{}` finished in {:?}", command_line, result.duration);
            }
            ExitStatus::Error(code) => {
                tracing::debug!(
                    "`{}` exited with {} after {:?}",
                    command_line,
                    code,
                    result.duration
                );
                if !result.stderr.is_empty() {
                    tracing::trace!("stderr: {}", result.stderr.trim_end());
                }
            }
            ExitStatus::Signal(signal) => {
                tracing::warn!("`{}` killed by signal {}", command_line, signal);
            }
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        let command_line = command.command_line();
        tracing::debug!("Running `{}`", command_line);
        if let Some(dir) = &command.working_dir {
            tracing::trace!("in {}", dir.display());
        }

        let start = Instant::now();
        let child = Self::prepare(&command)?.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProcessError::CommandNotFound(command.program.clone())
            } else {
                ProcessError::SpawnFailed {
                    command: command_line.clone(),
                    source: e,
                }
            }
        })?;

        let output = match command.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ProcessError::Timeout(limit))??,
            None => child.wait_with_output().await?,
        };

        let result = ProcessOutput {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start.elapsed(),
        };
        Self::log_result(&result, &command_line);
        Ok(result)
    }
}
