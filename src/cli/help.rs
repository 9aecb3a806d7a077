//! Log level and exit code helpers for the binary

use crate::error::CadenceError;
use crate::git::GitError;
use crate::schedule::ScheduleError;
use crate::session::SessionError;

/// Get the log filter for a verbosity count
pub fn get_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Process exit code for an error returned by a command
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    if let Some(err) = error.downcast_ref::<CadenceError>() {
        return err.exit_code();
    }
    if let Some(err) = error.downcast_ref::<GitError>() {
        return CadenceError::from(err.clone()).exit_code();
    }
    if let Some(err) = error.downcast_ref::<SessionError>() {
        return CadenceError::from(err.clone()).exit_code();
    }
    if let Some(err) = error.downcast_ref::<ScheduleError>() {
        return CadenceError::from(err.clone()).exit_code();
    }
    1
}
