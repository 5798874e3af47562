use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a state-mutation instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    AssertTagIn,
    AssertNoTag,
    AppendTag,
    RemoveTag,
    PushText,
    PushScene,
    GotoScene,
    UnlockGoal,
}

/// One instruction produced by rule or stitch acceptance and consumed by
/// [`WorldState::apply`](crate::WorldState::apply).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    /// Tag identifier or text key.
    pub tag: String,
    /// Location name, scene, or goal.
    pub location: String,
}

impl Operation {
    pub fn new(kind: OperationKind, tag: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            kind,
            tag: tag.into(),
            location: location.into(),
        }
    }

    pub fn assert_tag_in(tag: &str, location: &str) -> Self {
        Self::new(OperationKind::AssertTagIn, tag, location)
    }

    pub fn assert_no_tag(tag: &str, location: &str) -> Self {
        Self::new(OperationKind::AssertNoTag, tag, location)
    }

    pub fn append_tag(tag: &str, location: &str) -> Self {
        Self::new(OperationKind::AppendTag, tag, location)
    }

    pub fn remove_tag(tag: &str, location: &str) -> Self {
        Self::new(OperationKind::RemoveTag, tag, location)
    }

    pub fn goto_scene(scene: &str) -> Self {
        Self::new(OperationKind::GotoScene, "", scene)
    }

    /// True for the informational kinds that `apply` leaves alone.
    pub fn is_assertion(&self) -> bool {
        matches!(self.kind, OperationKind::AssertTagIn | OperationKind::AssertNoTag)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OperationKind::AssertTagIn => write!(f, "assert {} in {}", self.tag, self.location),
            OperationKind::AssertNoTag => write!(f, "assert no {} in {}", self.tag, self.location),
            OperationKind::AppendTag => write!(f, "append {} to {}", self.tag, self.location),
            OperationKind::RemoveTag => write!(f, "remove {} from {}", self.tag, self.location),
            OperationKind::PushText => write!(f, "push text {}", self.tag),
            OperationKind::PushScene => write!(f, "push scene {}", self.location),
            OperationKind::GotoScene => write!(f, "goto {}", self.location),
            OperationKind::UnlockGoal => write!(f, "unlock goal {}", self.location),
        }
    }
}
