use serde::{Deserialize, Serialize};

use crate::rule::Rule;
use crate::state::WorldState;
use crate::text::TextBook;

/// One compiled chapter: where play starts, what can be done, and what is said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tape {
    pub label: String,
    pub initial_state: WorldState,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub text: TextBook,
}

impl Tape {
    pub fn new(label: impl Into<String>, initial_state: WorldState) -> Self {
        Self {
            label: label.into(),
            initial_state,
            rules: Vec::new(),
            text: TextBook::default(),
        }
    }
}
