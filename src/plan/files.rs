//! File content for each planned commit
//!
//! Files are visited in a fixed rotation. Each commit rewrites its file from a
//! template stamped with the slot time, then applies one small mutation so
//! that consecutive diffs are not identical.

use crate::random::SeededRandom;
use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;

/// Files touched by generated commits, in rotation order
pub const ROTATION: [&str; 5] = [
    "activity.txt",
    "notes.md",
    "todo.txt",
    "changelog.md",
    "README.md",
];

const COMMENTS: [&str; 5] = [
    "TODO: review this",
    "FIXME: optimize later",
    "NOTE: important change",
    "Update: minor adjustment",
    "Refactor: improve structure",
];

/// Kinds of mutation applied on top of a file template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Comment,
    BlankLine,
    SmallEdit,
}

impl Mutation {
    const ALL: [Mutation; 3] = [Mutation::Comment, Mutation::BlankLine, Mutation::SmallEdit];
}

/// Produces the path and content for successive commits
#[derive(Debug, Clone, Default)]
pub struct FileMutator {
    rotation: usize,
}

impl FileMutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next file in the rotation
    pub fn next_file(&mut self) -> &'static str {
        let file = ROTATION[self.rotation % ROTATION.len()];
        self.rotation += 1;
        file
    }

    /// Template content for `file` at commit `index`
    pub fn base_content(file: &str, index: usize, timestamp: &DateTime<FixedOffset>) -> String {
        match file {
            "activity.txt" => format!(
                "Activity log entry {index}\nTimestamp: {}\n",
                timestamp.to_rfc3339()
            ),
            "notes.md" => format!("# Notes\n\n## Entry {index}\n\nSome thoughts and ideas...\n"),
            "todo.txt" => format!("- Task {index}\n- Review code\n- Update documentation\n"),
            "changelog.md" => format!("## Changes\n\n- Update {index}\n- Minor improvements\n"),
            "README.md" => format!("# Project\n\nVersion: 1.0.{index}\n\nA simple project.\n"),
            _ => format!("Update {index}\n{}\n", timestamp.to_rfc3339()),
        }
    }

    /// Next `(path, content)` pair; consumes two draws
    pub fn next_change(
        &mut self,
        index: usize,
        timestamp: &DateTime<FixedOffset>,
        rng: &mut SeededRandom,
    ) -> (PathBuf, String) {
        let file = self.next_file();
        let content = Self::base_content(file, index, timestamp);
        let mutation = Mutation::ALL[rng.next_below(Mutation::ALL.len() as u32) as usize];
        (PathBuf::from(file), apply_mutation(file, &content, mutation, rng))
    }
}

/// Apply `mutation` to `content`, consuming one draw
pub fn apply_mutation(
    file: &str,
    content: &str,
    mutation: Mutation,
    rng: &mut SeededRandom,
) -> String {
    match mutation {
        Mutation::Comment => {
            let comment = COMMENTS[rng.next_below(COMMENTS.len() as u32) as usize];
            format!("{}\n{content}", comment_line(file, comment))
        }
        Mutation::BlankLine => {
            let mut lines: Vec<&str> = content.split('\n').collect();
            let at = rng.next_below(lines.len() as u32) as usize;
            lines.insert(at, "");
            lines.join("\n")
        }
        Mutation::SmallEdit => match rng.next_below(3) {
            0 => format!("{content}\n{}\n", comment_line(file, "End of file")),
            1 => format!("{}\n{content}", comment_line(file, "Updated")),
            _ => content.replace('\n', "\n\n"),
        },
    }
}

fn comment_line(file: &str, text: &str) -> String {
    if file.ends_with(".md") {
        format!("<!-- {text} -->")
    } else {
        format!("# {text}")
    }
}
