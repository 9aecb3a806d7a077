//! CLI command handlers
//!
//! This module contains the argument model, the router that dispatches
//! subcommands and the terminal display helpers.

pub mod args;
pub mod commands;
pub mod display;
pub mod help;
pub mod router;

pub use args::{Cli, Commands, ScheduleArgs};
pub use help::{exit_code_for, get_log_level};
pub use router::execute_command;
