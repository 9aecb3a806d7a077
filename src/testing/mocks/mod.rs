//! Mock implementations for testing

pub mod repository;

pub use repository::{MockRepository, RecordedCommit};
