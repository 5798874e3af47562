use serde::{Deserialize, Serialize};

use crate::tag_set::TagSet;

/// A dialogue choice leading from one route node to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stitch {
    /// Text key of the short label shown in the choice list.
    pub choice: String,
    /// Name of the node the choice leads to.
    pub next: String,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub context: TagSet,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub cost: TagSet,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub payload: TagSet,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub gain: TagSet,
}

impl Stitch {
    pub fn new(choice: impl Into<String>, next: impl Into<String>) -> Self {
        Self {
            choice: choice.into(),
            next: next.into(),
            context: TagSet::new(),
            cost: TagSet::new(),
            payload: TagSet::new(),
            gain: TagSet::new(),
        }
    }
}

/// A named node of a dialogue route.
///
/// `text` keys are stored last-to-first; display them in reverse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteNode {
    pub text: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flow: Vec<Stitch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goto: Option<String>,
}

impl RouteNode {
    pub fn new(text: Vec<String>) -> Self {
        Self {
            text,
            flow: Vec::new(),
            goto: None,
        }
    }

    /// No choices and nowhere to go.
    pub fn is_terminal(&self) -> bool {
        self.flow.is_empty() && self.goto.is_none()
    }

    /// Text keys in reading order.
    pub fn reading_order(&self) -> impl Iterator<Item = &str> {
        self.text.iter().rev().map(String::as_str)
    }
}
