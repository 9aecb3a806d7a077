//! Turning schedule slots into concrete commits
//!
//! A plan pairs every [`CommitSlot`] with a message, a file path and the file
//! content to write. Planning draws from streams derived from the schedule
//! seed, never from the schedule's own stream, so the same seed always gives
//! the same slots whether or not a plan is built from them.

pub mod files;
pub mod messages;

pub use files::{apply_mutation, FileMutator, Mutation, ROTATION};
pub use messages::{render_template, MessageOptions, MessagePool, DEFAULT_MESSAGES};

use crate::random::SeededRandom;
use crate::schedule::CommitSlot;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const MESSAGE_STREAM: u32 = 0x6d73;
const FILE_STREAM: u32 = 0x6669;

/// One fully specified commit waiting to be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedCommit {
    pub slot: CommitSlot,
    pub message: String,
    /// Relative to the repository root
    pub file: PathBuf,
    pub content: String,
}

impl PlannedCommit {
    /// Short human-readable description used in progress output
    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            self.message,
            self.slot.timestamp.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Build the commit plan for `slots`
pub fn build_plan(slots: &[CommitSlot], messages: &MessageOptions, seed: u64) -> Vec<PlannedCommit> {
    let mut message_rng = SeededRandom::derived(seed, MESSAGE_STREAM);
    let mut file_rng = SeededRandom::derived(seed, FILE_STREAM);
    let mut pool = messages
        .use_pool
        .then(|| MessagePool::new(&messages.pool));
    let mut mutator = FileMutator::new();

    slots
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            let template = match pool.as_mut() {
                Some(pool) => pool.next_message(&mut message_rng).to_string(),
                None => messages.message.clone(),
            };
            let message = render_template(&template, &slot.timestamp, &mut message_rng);
            let (file, content) = mutator.next_change(index, &slot.timestamp, &mut file_rng);

            PlannedCommit {
                slot: slot.clone(),
                message,
                file,
                content,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{generate, ScheduleConfig, TimeWindow};
    use chrono::NaiveDate;

    fn slots(seed: u64) -> Vec<CommitSlot> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        let config = ScheduleConfig::new(start, end)
            .with_commits_per_day(2)
            .with_time_window(TimeWindow::Afternoon)
            .with_seed(seed);
        generate(config).unwrap().slots
    }

    #[test]
    fn test_fixed_message_plan() {
        let slots = slots(12345);
        let plan = build_plan(&slots, &MessageOptions::default(), 12345);

        assert_eq!(plan.len(), slots.len());
        assert!(plan.iter().all(|c| c.message == "minor update"));
        assert_eq!(plan[0].file, PathBuf::from("activity.txt"));
        assert_eq!(plan[5].file, PathBuf::from("activity.txt"));
        for (planned, slot) in plan.iter().zip(&slots) {
            assert_eq!(&planned.slot, slot);
        }
    }

    #[test]
    fn test_plan_is_reproducible() {
        let options = MessageOptions {
            use_pool: true,
            ..MessageOptions::default()
        };
        let slots = slots(777);
        assert_eq!(build_plan(&slots, &options, 777), build_plan(&slots, &options, 777));
    }

    #[test]
    fn test_pool_messages_vary() {
        let options = MessageOptions {
            use_pool: true,
            ..MessageOptions::default()
        };
        let plan = build_plan(&slots(5), &options, 5);
        let first_twenty: std::collections::HashSet<&str> =
            plan.iter().take(20).map(|c| c.message.as_str()).collect();
        assert_eq!(first_twenty.len(), 20);
    }

    #[test]
    fn test_template_uses_slot_date() {
        let options = MessageOptions {
            message: "log for {date}".to_string(),
            ..MessageOptions::default()
        };
        let slots = slots(1);
        let plan = build_plan(&slots, &options, 1);
        assert_eq!(plan[0].message, format!("log for {}", slots[0].day_label()));
    }
}
