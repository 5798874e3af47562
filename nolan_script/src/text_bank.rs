//! Mutable text repository used while compiling one tape.

use std::collections::BTreeMap;

use nolan_data::text::is_signal;
use nolan_data::{LineRange, Phase, Result, RouteNode, ScriptError, TextBook, line_key};

/// How a text sequence advances each time it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    /// `(?<a><b>)`: wraps around after the last line.
    Loop,
    /// `(!<a><b>)`: stays on the last line.
    Once,
}

#[derive(Debug, Default)]
pub struct TextBank {
    lines: BTreeMap<String, Vec<String>>,
    ranges: BTreeMap<String, Vec<LineRange>>,
    loops: Vec<String>,
    onces: Vec<String>,
}

impl TextBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lines.contains_key(name)
    }

    /// Append `text` under `name` and return the keys of the new lines, last first.
    ///
    /// A `(?<a><b>)` or `(!<a><b>)` literal declares a sequence. Any other text
    /// is split on `</>`, and `<$.../>` signals become lines of their own.
    ///
    /// # Errors
    /// `DuplicateKey` for a sequence whose name already has lines,
    /// `SyntaxError` for an unknown sequence opening, `NullOrEmpty` when no
    /// text is left after trimming (all in phase Text).
    pub fn append_line(&mut self, name: &str, text: &str) -> Result<Vec<String>> {
        let text = text.trim();
        if text.starts_with('(') && text.ends_with(">)") {
            let kind = if text.starts_with("(?<") {
                SequenceKind::Loop
            } else if text.starts_with("(!<") {
                SequenceKind::Once
            } else {
                return Err(ScriptError::syntax(
                    Phase::Text,
                    format!("sequence '{name}' must open with '(?<' or '(!<'"),
                ));
            };
            let parts: Vec<&str> = text[3..text.len() - 2].split("><").collect();
            return self.append_sequence(name, &parts, kind);
        }

        let pieces = split_pieces(text);
        if pieces.is_empty() {
            return Err(ScriptError::empty(Phase::Text, format!("text '{name}' is empty")));
        }

        let lines = self.lines.entry(name.to_string()).or_default();
        let start = lines.len();
        lines.extend(pieces);
        let end = lines.len();
        if end - start > 1 {
            self.ranges
                .entry(name.to_string())
                .or_default()
                .push(LineRange { start, end });
        }

        Ok((start..end)
            .rev()
            .map(|i| {
                let line = &lines[i];
                if is_signal(line) { line.clone() } else { line_key(name, i) }
            })
            .collect())
    }

    /// Declare `name` as a sequence of `parts`; returns `[name]`.
    ///
    /// # Errors
    /// See [`TextBank::append_line`].
    pub fn append_sequence(&mut self, name: &str, parts: &[&str], kind: SequenceKind) -> Result<Vec<String>> {
        if self.contains(name) {
            return Err(ScriptError::duplicate(Phase::Text, format!("sequence '{name}' already exists")));
        }
        for part in parts {
            self.append_line(name, part)?;
        }
        let counter = format!("{name}_0");
        match kind {
            SequenceKind::Loop => self.loops.push(counter),
            SequenceKind::Once => self.onces.push(counter),
        }
        Ok(vec![name.to_string()])
    }

    /// Starting counters `(loops, onces)`, each `name_0`, in declaration order.
    pub fn sequences(&self) -> (&[String], &[String]) {
        (&self.loops, &self.onces)
    }

    pub fn finish(self, routes: BTreeMap<String, RouteNode>) -> TextBook {
        TextBook {
            lines: self.lines,
            ranges: self.ranges,
            routes,
        }
    }
}

/// Split on `</>` and pull `<$.../>` signals out as pieces of their own.
fn split_pieces(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    for chunk in text.split("</>") {
        let mut rest = chunk;
        while let Some(open) = rest.find("<$") {
            let Some(close) = rest[open..].find("/>").map(|at| open + at) else {
                break;
            };
            push_trimmed(&mut pieces, &rest[..open]);
            pieces.push(rest[open..close + 2].to_string());
            rest = &rest[close + 2..];
        }
        push_trimmed(&mut pieces, rest);
    }
    pieces
}

fn push_trimmed(pieces: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        pieces.push(text.to_string());
    }
}
