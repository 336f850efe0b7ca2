use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const ERROR_PREFIX: &str = "Sorry, an error occurred: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub sender: Sender,
    pub text: String,
    pub is_error: bool,
    pub timestamp: DateTime<Utc>,
}

/// Transcript shown next to the deck. Independent of the deck: clearing one
/// never touches the other.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    entries: VecDeque<ChatEntry>,
    max_entries: usize,
}

impl ChatHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    pub fn add_user(&mut self, text: impl Into<String>) {
        self.push(Sender::User, text.into(), false);
    }

    pub fn add_assistant(&mut self, text: impl Into<String>) {
        self.push(Sender::Assistant, text.into(), false);
    }

    /// Records a failure the way it is shown to the user and returns that text.
    pub fn add_error(&mut self, failure: &str) -> String {
        let text = format!("{ERROR_PREFIX}{failure}");
        self.push(Sender::Assistant, text.clone(), true);
        text
    }

    /// Records `text` as an error exactly as given.
    pub fn add_failure_note(&mut self, text: impl Into<String>) {
        self.push(Sender::Assistant, text.into(), true);
    }

    pub fn entries(&self) -> Vec<ChatEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn push(&mut self, sender: Sender, text: String, is_error: bool) {
        self.entries.push_back(ChatEntry {
            sender,
            text,
            is_error,
            timestamp: Utc::now(),
        });

        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_entries_are_dropped() {
        let mut history = ChatHistory::new(2);
        history.add_user("one");
        history.add_assistant("two");
        history.add_user("three");

        let texts: Vec<_> = history.entries().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }

    #[test]
    fn errors_are_flagged_and_prefixed() {
        let mut history = ChatHistory::new(10);
        let shown = history.add_error("Failed to get response from server");

        assert_eq!(shown, "Sorry, an error occurred: Failed to get response from server");
        let entry = &history.entries()[0];
        assert!(entry.is_error);
        assert_eq!(entry.sender, Sender::Assistant);
    }

    #[test]
    fn failure_notes_are_flagged_without_prefix() {
        let mut history = ChatHistory::new(10);
        history.add_failure_note("Error generating PowerPoint: disk full");

        let entry = &history.entries()[0];
        assert!(entry.is_error);
        assert_eq!(entry.text, "Error generating PowerPoint: disk full");
    }

    #[test]
    fn clear_empties_history() {
        let mut history = ChatHistory::new(10);
        history.add_user("hello");
        history.clear();
        assert!(history.entries().is_empty());
    }
}
