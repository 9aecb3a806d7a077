//! # Cadence
//!
//! Synthesize a reproducible, human-looking commit schedule and replay it
//! against a git working tree.
//!
//! ## Usage
//!
//! ```bash
//! cadence preview --start 2024-01-01 --end 2024-03-31 --human
//! cadence run --start 2024-01-01 --end 2024-03-31 --human --auto-push
//! ```
//!
//! ## Modules
//!
//! - `random` - Seeded pseudo-random stream every generation decision draws from
//! - `analysis` - Hour and weekday distribution of existing history
//! - `schedule` - Commit slot generation, preview stats and heatmap
//! - `plan` - Messages, files and content for every slot
//! - `validation` - Pre-run checks with errors, warnings and a risk flag
//! - `session` - Session ids, states and the single-admission registry
//! - `execution` - Single-flight run controller with progress and cancellation
//! - `repository` - Repository trait used by execution and analysis
//! - `git` - Git command layer over the subprocess runner
//! - `inspect` - Read-only repository inspection through libgit2
//! - `ledger` - Record of the last run, used by undo
//! - `subprocess` - Subprocess abstraction layer for testing
//! - `config` - Configuration files and environment overrides
//! - `error` - Unified error type with numeric codes
//! - `cli` - Argument parsing and command handlers
//! - `testing` - Test doubles shared by unit and integration tests
pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod git;
pub mod inspect;
pub mod ledger;
pub mod plan;
pub mod random;
pub mod repository;
pub mod schedule;
pub mod session;
pub mod subprocess;
pub mod validation;

pub mod testing;

pub use error::{CadenceError, ErrorCode};
