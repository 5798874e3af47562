//! Ordered, deduplicated tag collections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScriptError};
use crate::tag::Tag;

/// Tags sorted by raw text with duplicates removed, so derived equality and
/// hashing do not depend on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `;`-separated textual form. Empty members are skipped.
    ///
    /// # Errors
    /// Returns the first tag parse error.
    pub fn parse(text: &str) -> Result<Self> {
        text.split(';')
            .map(str::trim)
            .filter(|member| !member.is_empty())
            .map(Tag::parse)
            .collect()
    }

    /// Concatenate several sets into one.
    pub fn concat<'a>(sets: impl IntoIterator<Item = &'a TagSet>) -> TagSet {
        sets.into_iter().flat_map(|set| set.tags.iter().cloned()).collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.tags.iter()
    }

    /// Identifiers of the members, in raw-text order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(Tag::value)
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.tags.binary_search(tag).is_ok()
    }

    pub fn contains_raw(&self, raw: &str) -> bool {
        self.tags.iter().any(|tag| tag.raw() == raw)
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.tags.iter().any(|tag| tag.value() == value)
    }

    pub fn insert(&mut self, tag: Tag) {
        if let Err(at) = self.tags.binary_search(&tag) {
            self.tags.insert(at, tag);
        }
    }

    /// Drop every member whose raw text is `raw`; returns whether anything was removed.
    pub fn remove_raw(&mut self, raw: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|tag| tag.raw() != raw);
        self.tags.len() != before
    }

    /// A copy of this set with `old` swapped for `new`.
    #[must_use]
    pub fn replace(&self, old: &Tag, new: Tag) -> TagSet {
        let mut replaced = self.clone();
        replaced.tags.retain(|tag| tag != old);
        replaced.insert(new);
        replaced
    }

    /// The first member, in set order, that needs sugar expansion.
    pub fn first_sugar(&self) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.contains_sugar())
    }

    pub fn contains_sugar(&self) -> bool {
        self.first_sugar().is_some()
    }

    /// Expand every sugar member against `pool`.
    ///
    /// Only the first sugar member is expanded at a time; each resulting set is
    /// then expanded further before the next expansion of the same member is
    /// looked at. The output order is therefore leftmost-first, depth-first.
    /// A set without sugar resolves to itself.
    ///
    /// # Errors
    /// Propagates tag re-parse errors from [`Tag::resolve_syntax`].
    pub fn resolve_syntax(&self, pool: &TagSet) -> Result<Vec<TagSet>> {
        let mut resolved = Vec::new();
        let mut pending = vec![self.clone()];

        while let Some(set) = pending.pop() {
            let Some(sugar) = set.first_sugar() else {
                resolved.push(set);
                continue;
            };
            let expansions = sugar.resolve_syntax(pool)?;
            if expansions.len() == 1 && expansions[0] == *sugar {
                // the template could not be interpreted; keep it verbatim
                resolved.push(set);
                continue;
            }
            let sets: Vec<TagSet> = expansions.into_iter().map(|tag| set.replace(sugar, tag)).collect();
            pending.extend(sets.into_iter().rev());
        }

        Ok(resolved)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            f.write_str(tag.raw())?;
        }
        Ok(())
    }
}

impl FromStr for TagSet {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self> {
        TagSet::parse(s)
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut tags: Vec<Tag> = iter.into_iter().collect();
        tags.sort();
        tags.dedup();
        TagSet { tags }
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

impl TryFrom<Vec<String>> for TagSet {
    type Error = ScriptError;

    fn try_from(raws: Vec<String>) -> Result<Self> {
        raws.iter().map(|raw| Tag::parse(raw)).collect()
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.tags.into_iter().map(String::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(text: &str) -> TagSet {
        TagSet::parse(text).expect("set parses")
    }

    #[test]
    fn sorted_and_deduplicated() {
        let tags = set("king;hero;door;hero;");
        assert_eq!(tags.to_string(), "door;hero;king");
        assert_eq!(tags.len(), 3);
        assert_eq!(set("a;b"), set("b;a"));
    }

    #[test]
    fn textual_form_round_trips() {
        let tags = set("?sword;!hero.sword;gold.1..5;door<CAVE>");
        assert_eq!(set(&tags.to_string()), tags);
        assert!(set("").is_empty());
    }

    #[test]
    fn membership_by_raw_and_value() {
        let tags = set("?sword;door");
        assert!(tags.contains_raw("?sword"));
        assert!(!tags.contains_raw("sword"));
        assert!(tags.contains_value("sword"));
        assert!(tags.contains(&Tag::parse("door").unwrap()));
    }

    #[test]
    fn replace_and_concat() {
        let tags = set("gold.++;hero");
        let old = Tag::parse("gold.++").unwrap();
        let swapped = tags.replace(&old, Tag::parse("gold.6").unwrap());
        assert_eq!(swapped.to_string(), "gold.6;hero");

        let joined = TagSet::concat([&set("a;b"), &set("b;c")]);
        assert_eq!(joined.to_string(), "a;b;c");
    }

    #[test]
    fn expands_leftmost_first_depth_first() {
        let pool = set("coin.1;coin.2;gem.a;gem.b");
        let resolved = set("coin.++;gem.*").resolve_syntax(&pool).unwrap();
        let rendered: Vec<String> = resolved.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            ["coin.2;gem.a", "coin.2;gem.b", "coin.3;gem.a", "coin.3;gem.b"]
        );
    }

    #[test]
    fn unmatched_sugar_yields_nothing() {
        let resolved = set("gold.++;hero").resolve_syntax(&set("silver.2")).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn sets_without_sugar_resolve_to_themselves() {
        let tags = set("door;hero");
        assert_eq!(tags.resolve_syntax(&set("x")).unwrap(), vec![tags.clone()]);
    }
}
