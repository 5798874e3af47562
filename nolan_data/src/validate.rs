use std::fmt;

use crate::text::{TextBook, is_signal};
use crate::*;

/// A dangling reference or malformed range inside a compiled tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingText { key: String, context: String },
    MissingTarget { name: String, context: String },
    InvalidRange { name: String, start: usize, end: usize, len: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingText { key, context } => {
                write!(f, "missing text '{key}' ({context})")
            },
            ValidationError::MissingTarget { name, context } => {
                write!(f, "missing route node or text '{name}' ({context})")
            },
            ValidationError::InvalidRange { name, start, end, len } => {
                write!(f, "range {start}..{end} of '{name}' exceeds its {len} lines")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check that every key and link inside a tape resolves.
///
/// ```
/// use nolan_data::{Location, Rule, Tag, TagSet, Tape, WorldState, validate_tape};
///
/// let state = WorldState::from_locations([Location::new("HOME", TagSet::parse("door").unwrap())]);
/// let mut tape = Tape::new("INTRO", state);
/// let mut rule = Rule::new(Tag::parse("?door").unwrap());
/// rule.text = Some("KNOCK".into());
/// tape.rules.push(rule);
/// assert_eq!(validate_tape(&tape).len(), 1);
///
/// tape.text.lines.insert("KNOCK".into(), vec!["Nobody answers.".into()]);
/// assert!(validate_tape(&tape).is_empty());
/// ```
pub fn validate_tape(tape: &Tape) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let book = &tape.text;

    for (i, rule) in tape.rules.iter().enumerate() {
        if let Some(key) = &rule.text
            && book.route(key).is_none()
        {
            check_text(book, key, || format!("rule {} [{}]", i + 1, rule.match_tag), &mut errors);
        }
    }

    for (name, node) in &book.routes {
        for key in &node.text {
            check_text(book, key, || format!("route node '{name}'"), &mut errors);
        }
        for stitch in &node.flow {
            check_text(book, &stitch.choice, || format!("choice of route node '{name}'"), &mut errors);
            check_target(book, &stitch.next, || format!("stitch of route node '{name}'"), &mut errors);
        }
        if let Some(goto) = &node.goto {
            check_target(book, goto, || format!("goto of route node '{name}'"), &mut errors);
        }
    }

    for (name, ranges) in &book.ranges {
        let len = book.line_count(name);
        for range in ranges {
            if range.start > range.end || range.end > len {
                errors.push(ValidationError::InvalidRange {
                    name: name.clone(),
                    start: range.start,
                    end: range.end,
                    len,
                });
            }
        }
    }

    errors
}

fn check_text(book: &TextBook, key: &str, context: impl FnOnce() -> String, errors: &mut Vec<ValidationError>) {
    if !is_signal(key) && !book.has_line(key) {
        errors.push(ValidationError::MissingText {
            key: key.to_string(),
            context: context(),
        });
    }
}

fn check_target(book: &TextBook, name: &str, context: impl FnOnce() -> String, errors: &mut Vec<ValidationError>) {
    if book.route(name).is_none() && !book.has_line(name) {
        errors.push(ValidationError::MissingTarget {
            name: name.to_string(),
            context: context(),
        });
    }
}
