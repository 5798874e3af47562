//! World state: named locations, each holding a tag set.
//!
//! States are values. [`WorldState::apply`] folds operations into a new state
//! and leaves the receiver untouched.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{Phase, Result, ScriptError};
use crate::operation::{Operation, OperationKind};
use crate::tag::Tag;
use crate::tag_set::TagSet;

/// The player's held items.
pub const DRAG: &str = "DRAG";
/// Counters of looping text sequences.
pub const LOOP: &str = "LOOP";
/// Counters of text sequences that stop on their last line.
pub const ONCE: &str = "ONCE";

pub fn is_drag(name: &str) -> bool {
    name.eq_ignore_ascii_case(DRAG)
}

/// True for the locations that are not places the player can be in.
pub fn is_reserved(name: &str) -> bool {
    is_drag(name) || name.eq_ignore_ascii_case(LOOP) || name.eq_ignore_ascii_case(ONCE)
}

/// A named bucket of tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub tags: TagSet,
}

impl Location {
    pub fn new(name: impl Into<String>, tags: TagSet) -> Self {
        Self { name: name.into(), tags }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.name, self.tags)
    }
}

/// Locations in declaration order; names are matched case-insensitively.
///
/// Equality and hashing go through [`WorldState::canonical`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldState {
    locations: Vec<Location>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state; a repeated name replaces the earlier location's tags.
    pub fn from_locations(locations: impl IntoIterator<Item = Location>) -> Self {
        locations
            .into_iter()
            .fold(WorldState::new(), |state, location| state.with_location(location.name, location.tags))
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn location(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name.eq_ignore_ascii_case(name))
    }

    pub fn tags(&self, name: &str) -> Option<&TagSet> {
        self.location(name).map(|l| &l.tags)
    }

    pub fn drag(&self) -> Option<&TagSet> {
        self.tags(DRAG)
    }

    /// Every location except DRAG.
    pub fn scenes(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter().filter(|l| !is_drag(&l.name))
    }

    /// A copy with `name` holding `tags`, appended when the location is new.
    #[must_use]
    pub fn with_location(&self, name: impl Into<String>, tags: TagSet) -> WorldState {
        let name = name.into();
        let mut locations = self.locations.clone();
        match locations.iter_mut().find(|l| l.name.eq_ignore_ascii_case(&name)) {
            Some(existing) => existing.tags = tags,
            None => locations.push(Location::new(name, tags)),
        }
        WorldState { locations }
    }

    /// Fold `operations` into a new state.
    ///
    /// # Errors
    /// See [`WorldState::apply_in_scene`].
    pub fn apply(&self, operations: &[Operation]) -> Result<WorldState> {
        self.apply_in_scene(operations, "").map(|(state, _)| state)
    }

    /// Fold `operations` into a new state and follow any scene change.
    ///
    /// Assertions are skipped. A location emptied by `RemoveTag` disappears.
    ///
    /// # Errors
    /// `KeyNotFound` when removing from a location that does not exist, and the
    /// tag parse error of an appended tag.
    pub fn apply_in_scene(&self, operations: &[Operation], scene: &str) -> Result<(WorldState, String)> {
        let mut locations = self.locations.clone();
        let mut scene = scene.to_string();

        for op in operations {
            let at = locations.iter().position(|l| l.name.eq_ignore_ascii_case(&op.location));
            match op.kind {
                OperationKind::RemoveTag => {
                    let Some(at) = at else {
                        return Err(ScriptError::not_found(
                            Phase::Play,
                            format!("cannot remove '{}': no location '{}'", op.tag, op.location),
                        ));
                    };
                    locations[at].tags.remove_raw(&op.tag);
                    if locations[at].tags.is_empty() {
                        locations.remove(at);
                    }
                },
                OperationKind::AppendTag => {
                    let tag = Tag::parse(&op.tag).map_err(|e| e.in_phase(Phase::Play))?;
                    match at {
                        Some(at) => locations[at].tags.insert(tag),
                        None => locations.push(Location::new(op.location.clone(), TagSet::from_iter([tag]))),
                    }
                },
                OperationKind::GotoScene => scene.clone_from(&op.location),
                _ => {},
            }
        }

        Ok((WorldState { locations }, scene))
    }

    /// `== [LOC, tag;tag] ...`, locations sorted with DRAG last.
    pub fn canonical(&self) -> String {
        if self.locations.is_empty() {
            return format!("== [{DRAG}, ]");
        }
        let mut rendered: Vec<(bool, String)> = self
            .locations
            .iter()
            .map(|l| (is_drag(&l.name), l.to_string()))
            .collect();
        rendered.sort();
        let parts: Vec<String> = rendered.into_iter().map(|(_, text)| text).collect();
        format!("== {}", parts.join(" "))
    }
}

impl fmt::Display for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl PartialEq for WorldState {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for WorldState {}

impl Hash for WorldState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}
