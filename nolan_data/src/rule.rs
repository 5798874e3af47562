use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tag::Tag;
use crate::tag_set::TagSet;

fn default_drag() -> bool {
    true
}

fn is_drag(drag: &bool) -> bool {
    *drag
}

/// A conditional production: when `match_tag` is found in the scene and the
/// other sets check out, the rule may be played.
///
/// Equality ignores the text key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "match")]
    pub match_tag: Tag,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub context: TagSet,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub cost: TagSet,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub payload: TagSet,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub gain: TagSet,
    /// Cost is paid from DRAG (`{cost}-`) rather than from the scene (`-{cost}`).
    #[serde(default = "default_drag", skip_serializing_if = "is_drag")]
    pub drag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Rule {
    /// A rule with an empty drag cost and nothing else.
    pub fn new(match_tag: Tag) -> Self {
        Self {
            match_tag,
            context: TagSet::new(),
            cost: TagSet::new(),
            payload: TagSet::new(),
            gain: TagSet::new(),
            drag: true,
            text: None,
        }
    }

    pub fn contains_sugar(&self) -> bool {
        self.match_tag.contains_sugar()
            || self.context.contains_sugar()
            || self.cost.contains_sugar()
            || self.payload.contains_sugar()
            || self.gain.contains_sugar()
    }

    /// Player-facing label, e.g. `"Drag the hero onto the door. "`.
    pub fn description(&self) -> String {
        let target = self.match_tag.value().replace('.', " with ");
        if self.cost.is_empty() {
            return format!("Poke the {target}. ");
        }
        let cost: Vec<&str> = self.cost.values().collect();
        format!("Drag the {} onto the {target}. ", cost.join(" and ").replace('.', " with "))
    }

    /// A copy carrying the same text key with the five sets replaced.
    #[must_use]
    pub fn with_sets(&self, match_tag: Tag, context: TagSet, cost: TagSet, payload: TagSet, gain: TagSet) -> Rule {
        Rule {
            match_tag,
            context,
            cost,
            payload,
            gain,
            drag: self.drag,
            text: self.text.clone(),
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.match_tag == other.match_tag
            && self.context == other.context
            && self.cost == other.cost
            && self.payload == other.payload
            && self.gain == other.gain
            && self.drag == other.drag
    }
}

impl Eq for Rule {}

/// Renders the rule head, `++ (context)cost[match]->(payload){gain}`.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("++ ")?;
        if !self.context.is_empty() {
            write!(f, "({})", self.context)?;
        } else if !self.drag {
            f.write_str("()")?;
        }

        if self.cost.is_empty() {
            if self.drag && self.context.is_empty() {
                f.write_str("()")?;
            }
            f.write_str("-")?;
        } else if self.drag {
            write!(f, "{{{}}}-", self.cost)?;
        } else {
            write!(f, "-{{{}}}", self.cost)?;
        }

        write!(f, "[{}]->", self.match_tag)?;
        if !self.payload.is_empty() {
            write!(f, "({})", self.payload)?;
        }
        if !self.gain.is_empty() {
            write!(f, "{{{}}}", self.gain)?;
        }
        if self.payload.is_empty() && self.gain.is_empty() {
            f.write_str("()")?;
        }
        Ok(())
    }
}
