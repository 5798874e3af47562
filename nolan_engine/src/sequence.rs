//! Reading text names, including looping and one-shot sequences.
//!
//! A sequence keeps its position as a counter tag `NAME_i` in the LOOP or
//! ONCE location. Reading the sequence shows line `i` and moves the counter:
//! loops wrap around, one-shot sequences stop on their last line.

use nolan_data::{LOOP, ONCE, Operation, Result, TextBook, WorldState, line_key};
use nolan_script::SequenceKind;

/// The line keys to show for a name and the operations that advance it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reading {
    pub keys: Vec<String>,
    pub operations: Vec<Operation>,
}

/// Kind and position of the sequence `name`, if it is one.
pub fn counter(state: &WorldState, name: &str) -> Option<(SequenceKind, usize)> {
    let prefix = format!("{name}_");
    [(LOOP, SequenceKind::Loop), (ONCE, SequenceKind::Once)]
        .into_iter()
        .find_map(|(location, kind)| {
            state.tags(location)?.values().find_map(|value| {
                let index = value.strip_prefix(&prefix)?.parse::<usize>().ok()?;
                Some((kind, index))
            })
        })
}

/// Resolve `name` to the keys of the lines it shows right now.
///
/// A plain name shows all of its lines. A sequence shows its current line
/// and carries the operations moving its counter. Signals and explicit
/// `NAME_i` keys resolve to themselves.
///
/// # Errors
/// `KeyNotFound` or `OutOfRange` when `name` resolves to no line.
pub fn read_name(book: &TextBook, state: &WorldState, name: &str) -> Result<Reading> {
    if let Some(reading) = read_sequence(book, state, name) {
        return Ok(reading);
    }
    let count = book.line_count(name);
    if count > 0 {
        return Ok(Reading {
            keys: (0..count).map(|i| line_key(name, i)).collect(),
            operations: Vec::new(),
        });
    }
    read_key(book, state, name)
}

/// Resolve a single line key; a sequence name still shows its current line.
///
/// # Errors
/// `KeyNotFound` or `OutOfRange` when `key` resolves to no line.
pub fn read_key(book: &TextBook, state: &WorldState, key: &str) -> Result<Reading> {
    if let Some(reading) = read_sequence(book, state, key) {
        return Ok(reading);
    }
    book.line(key)?;
    Ok(Reading {
        keys: vec![key.to_string()],
        operations: Vec::new(),
    })
}

fn read_sequence(book: &TextBook, state: &WorldState, name: &str) -> Option<Reading> {
    let count = book.line_count(name);
    let (kind, index) = counter(state, name).filter(|_| count > 0)?;
    let index = index.min(count - 1);
    let (next, location) = match kind {
        SequenceKind::Loop => ((index + 1) % count, LOOP),
        SequenceKind::Once => ((index + 1).min(count - 1), ONCE),
    };
    let mut operations = Vec::new();
    if next != index {
        operations.push(Operation::remove_tag(&format!("{name}_{index}"), location));
        operations.push(Operation::append_tag(&format!("{name}_{next}"), location));
    }
    Some(Reading {
        keys: vec![line_key(name, index)],
        operations,
    })
}
