//! Commit message selection

use crate::random::SeededRandom;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Built-in pool used when no custom messages are configured
pub const DEFAULT_MESSAGES: [&str; 20] = [
    "minor update",
    "fix typo",
    "update documentation",
    "refactor code",
    "improve performance",
    "update dependencies",
    "clean up code",
    "add comments",
    "fix formatting",
    "update README",
    "minor improvements",
    "code cleanup",
    "update config",
    "fix bug",
    "enhance functionality",
    "optimize code",
    "update styles",
    "improve logic",
    "add validation",
    "update tests",
];

pub const DEFAULT_MESSAGE: &str = "minor update";

/// Where commit messages come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageOptions {
    /// Used for every commit unless `use_pool` is set
    pub message: String,
    /// Draw from `pool` (or the built-in list when it is empty)
    pub use_pool: bool,
    pub pool: Vec<String>,
}

impl Default for MessageOptions {
    fn default() -> Self {
        Self {
            message: DEFAULT_MESSAGE.to_string(),
            use_pool: false,
            pool: Vec::new(),
        }
    }
}

/// Draws messages without repeating one until every entry has been used
#[derive(Debug, Clone)]
pub struct MessagePool {
    messages: Vec<String>,
    unused: Vec<usize>,
}

impl MessagePool {
    /// A pool over `custom`, or over [`DEFAULT_MESSAGES`] when `custom` is empty
    pub fn new(custom: &[String]) -> Self {
        let messages: Vec<String> = if custom.is_empty() {
            DEFAULT_MESSAGES.iter().map(|m| m.to_string()).collect()
        } else {
            custom.to_vec()
        };
        let unused = (0..messages.len()).collect();
        Self { messages, unused }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Next message, consuming one draw
    pub fn next_message(&mut self, rng: &mut SeededRandom) -> &str {
        if self.unused.is_empty() {
            self.unused = (0..self.messages.len()).collect();
        }
        let pick = rng.next_below(self.unused.len() as u32) as usize;
        let index = self.unused.swap_remove(pick);
        &self.messages[index]
    }
}

/// Expand `{date}`, `{time}` and `{random}` placeholders.
///
/// `{random}` is a number in `[0, 1000)` and only consumes a draw when present.
pub fn render_template(
    template: &str,
    timestamp: &DateTime<FixedOffset>,
    rng: &mut SeededRandom,
) -> String {
    let mut rendered = template
        .replace("{date}", &timestamp.format("%Y-%m-%d").to_string())
        .replace("{time}", &timestamp.format("%H:%M:%S").to_string());
    if rendered.contains("{random}") {
        rendered = rendered.replace("{random}", &rng.next_below(1000).to_string());
    }
    rendered
}
