//! Collector of the tag identifiers a script mentions.
//!
//! Nothing in compilation reads it back; the CLI exports it so authors can
//! spot typos across a large script.

use std::collections::BTreeSet;

use nolan_data::{Rule, Stitch, Tag, TagSet, WorldState};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRegistry {
    values: BTreeSet<String>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the identifier of `tag`. Sugar and sequence counters
    /// (`name_3`) are skipped.
    pub fn record(&mut self, tag: &Tag) {
        if tag.contains_sugar() || is_counter(tag.value()) {
            return;
        }
        self.values.insert(tag.value().to_string());
    }

    pub fn record_set(&mut self, set: &TagSet) {
        for tag in set.iter() {
            self.record(tag);
        }
    }

    pub fn record_state(&mut self, state: &WorldState) {
        for location in state.locations() {
            self.record_set(&location.tags);
        }
    }

    pub fn record_rule(&mut self, rule: &Rule) {
        self.record(&rule.match_tag);
        for set in [&rule.context, &rule.cost, &rule.payload, &rule.gain] {
            self.record_set(set);
        }
    }

    pub fn record_stitch(&mut self, stitch: &Stitch) {
        for set in [&stitch.context, &stitch.cost, &stitch.payload, &stitch.gain] {
            self.record_set(set);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    /// Identifiers sorted case-insensitively, exact order breaking ties.
    pub fn sorted(&self) -> Vec<&str> {
        let mut values: Vec<&str> = self.values.iter().map(String::as_str).collect();
        values.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
        values
    }
}

fn is_counter(value: &str) -> bool {
    value
        .rsplit_once('_')
        .is_some_and(|(_, index)| index.parse::<usize>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(text: &str) -> Tag {
        Tag::parse(text).unwrap()
    }

    #[test]
    fn records_identifiers_once() {
        let mut registry = TagRegistry::new();
        registry.record(&tag("?hero<HOME>"));
        registry.record(&tag("!hero"));
        registry.record(&tag("dragon.fire<CAVE>"));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("hero"));
        assert!(registry.contains("dragon.fire"));
    }

    #[test]
    fn skips_sugar_and_counters() {
        let mut registry = TagRegistry::new();
        registry.record(&tag("weapon.*"));
        registry.record(&tag("gold.++"));
        registry.record(&tag("TALK_0"));
        registry.record(&tag("TALK-2-0_0"));
        registry.record(&tag("old_map_3"));
        assert!(registry.is_empty());
        registry.record(&tag("map_3_old"));
        assert!(registry.contains("map_3_old"));
        registry.record(&tag("snake_case"));
        assert!(registry.contains("snake_case"));
    }

    #[test]
    fn sorted_ignores_case() {
        let mut registry = TagRegistry::new();
        registry.record_set(&TagSet::parse("king;Dragon;castle;door").unwrap());
        assert_eq!(registry.sorted(), ["castle", "door", "Dragon", "king"]);
    }

    #[test]
    fn records_whole_rules() {
        let mut rule = nolan_data::Rule::new(tag("?door<CAVE>"));
        rule.context = TagSet::parse("dragon<CAVE>").unwrap();
        rule.cost = TagSet::parse("hero").unwrap();
        rule.payload = TagSet::parse("dragon.fire<CAVE>").unwrap();
        let mut registry = TagRegistry::new();
        registry.record_rule(&rule);
        assert_eq!(registry.sorted(), ["door", "dragon", "dragon.fire", "hero"]);
    }
}
