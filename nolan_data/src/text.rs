//! Compiled text of a tape: lines, line ranges and dialogue routes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Phase, Result, ScriptError};
use crate::route::RouteNode;

/// Lines `start..end` of one name that were written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBook {
    #[serde(default)]
    pub lines: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ranges: BTreeMap<String, Vec<LineRange>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub routes: BTreeMap<String, RouteNode>,
}

/// Key of line `index` of `name`: the bare name for the first line, `name_index` after.
pub fn line_key(name: &str, index: usize) -> String {
    if index == 0 { name.to_string() } else { format!("{name}_{index}") }
}

/// Signal lines (`<$.../>`) are their own keys.
pub fn is_signal(key: &str) -> bool {
    key.starts_with("<$") && key.ends_with("/>")
}

impl TextBook {
    /// Resolve a line key (`NAME`, `NAME_2`, optionally followed by `%` or `#`).
    ///
    /// # Errors
    /// `KeyNotFound` for an unknown name, `OutOfRange` for an index past the
    /// last line.
    pub fn line<'a>(&'a self, key: &'a str) -> Result<&'a str> {
        let key = key.trim_end_matches(['%', '#']);
        if is_signal(key) {
            return Ok(key);
        }
        if let Some(first) = self.lines.get(key).and_then(|lines| lines.first()) {
            return Ok(first);
        }

        let (name, index) = key
            .rsplit_once('_')
            .and_then(|(name, index)| Some((name, index.parse::<usize>().ok()?)))
            .ok_or_else(|| ScriptError::not_found(Phase::Text, format!("no text '{key}'")))?;
        let lines = self
            .lines
            .get(name)
            .ok_or_else(|| ScriptError::not_found(Phase::Text, format!("no text '{name}'")))?;
        lines.get(index).map(String::as_str).ok_or_else(|| {
            ScriptError::out_of_range(Phase::Text, format!("text '{name}' has {} lines, no line {index}", lines.len()))
        })
    }

    pub fn line_count(&self, name: &str) -> usize {
        self.lines.get(name).map_or(0, Vec::len)
    }

    pub fn route(&self, name: &str) -> Option<&RouteNode> {
        self.routes.get(name)
    }

    /// True when `key` resolves to a line.
    pub fn has_line(&self, key: &str) -> bool {
        self.line(key).is_ok()
    }
}
