//! Keyword heuristic deciding whether an utterance edits the current deck.
//!
//! No negation handling and no scoring: "add to the list of benefits" reads
//! as an edit whenever a deck exists.

use deckchat_common::Intent;

pub const EDIT_KEYWORDS: [&str; 7] = [
    "edit",
    "update",
    "change",
    "modify",
    "replace",
    "add to",
    "remove from",
];

pub fn has_edit_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    EDIT_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Edit only when a keyword matches and there is a deck to edit.
pub fn classify_intent(text: &str, deck_len: usize) -> Intent {
    if deck_len > 0 && has_edit_keyword(text) {
        Intent::Edit
    } else {
        Intent::Create
    }
}
