//! Git data structures

use serde::{Deserialize, Serialize};

/// Git commit identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId {
    hash: String,
}

impl CommitId {
    pub fn new(hash: String) -> Self {
        Self { hash }
    }

    /// Get the full commit hash
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Get the short commit hash (first 7 characters)
    pub fn short_hash(&self) -> &str {
        if self.hash.len() >= 7 {
            &self.hash[..7]
        } else {
            &self.hash
        }
    }

    /// Check if this looks like a commit hash
    pub fn is_valid(&self) -> bool {
        !self.hash.is_empty() && self.hash.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

impl From<String> for CommitId {
    fn from(hash: String) -> Self {
        Self::new(hash)
    }
}

impl From<&str> for CommitId {
    fn from(hash: &str) -> Self {
        Self::new(hash.to_string())
    }
}

/// One entry of `git log`: a commit and its raw author timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: CommitId,
    /// Unparsed, as printed by git
    pub timestamp: String,
}
