//! Rule acceptance, sugar expansion and the per-turn action list.
//!
//! A rule is tested against one scene of a world state. Acceptance either
//! rejects (`Ok(None)`), a normal outcome, or yields the operations that
//! playing the rule would apply. Only a gain that collides with a cost is
//! an error.

use log::debug;
use nolan_data::{DRAG, Operation, Phase, Result, Rule, ScriptError, Tag, TagOp, TagSet, WorldState, is_drag};

/// A rule that applies: its text key and the operations it performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub text: Option<String>,
    pub operations: Vec<Operation>,
}

/// One entry of the action list offered to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub description: String,
    pub text: Option<String>,
    pub operations: Vec<Operation>,
}

/// Accepted actions in rulebook order, with unique descriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actions {
    actions: Vec<Action>,
}

impl Actions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action; a description already listed (ignoring case) gets
    /// `" duplicate"` appended until it is unique.
    pub fn push(&mut self, mut action: Action) {
        while self.get(&action.description).is_some() {
            action.description.push_str(" duplicate");
        }
        self.actions.push(action);
    }

    /// Look an action up by description, ignoring case.
    pub fn get(&self, description: &str) -> Option<&Action> {
        let wanted = description.to_lowercase();
        self.actions.iter().find(|a| a.description.to_lowercase() == wanted)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<'a> IntoIterator for &'a Actions {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

/// Test `rule` against `scene`.
///
/// # Errors
/// `SyntaxError` (phase Rule) when a gain tag cannot be appended to DRAG
/// while a cost tag carries the same identifier.
pub fn accept(rule: &Rule, scene: &str, state: &WorldState) -> Result<Option<Accepted>> {
    let Some(location) = state.location(scene) else {
        return Ok(None);
    };
    let matched = &rule.match_tag;
    if !location.tags.contains_value(matched.value()) || matched.op() == TagOp::FailedIfPresent {
        return Ok(None);
    }

    let name = location.name.as_str();
    let mut ops = Vec::new();
    if let Some(target) = matched.location() {
        // a scene change must land in a location of this world
        let Some(target) = state.location(target) else {
            return Ok(None);
        };
        ops.push(Operation::goto_scene(&target.name));
    }
    ops.push(Operation::assert_tag_in(matched.value(), name));
    if matched.op() == TagOp::RemoveOrAppend {
        ops.push(Operation::remove_tag(matched.value(), name));
    }

    if !rule.drag && !check_cost(&rule.cost, &location.tags, name, &mut ops) {
        return Ok(None);
    }
    if accept_sets(rule, name, state, &mut ops)? {
        Ok(Some(Accepted {
            text: rule.text.clone(),
            operations: ops,
        }))
    } else {
        Ok(None)
    }
}

/// Three-way check of cost tags against one location's tags.
fn check_cost(cost: &TagSet, tags: &TagSet, location: &str, ops: &mut Vec<Operation>) -> bool {
    for tag in cost.iter() {
        let present = tags.contains_value(tag.value());
        match tag.op() {
            TagOp::RemoveOrAppend if present => {
                ops.push(Operation::assert_tag_in(tag.value(), location));
                ops.push(Operation::remove_tag(tag.value(), location));
            },
            TagOp::SucceedIfPresent if present => ops.push(Operation::assert_tag_in(tag.value(), location)),
            TagOp::FailedIfPresent if !present => ops.push(Operation::assert_no_tag(tag.value(), location)),
            _ => return false,
        }
    }
    true
}

/// Drag cost, gain, context and payload, in that order.
fn accept_sets(rule: &Rule, scene: &str, state: &WorldState, ops: &mut Vec<Operation>) -> Result<bool> {
    let empty = TagSet::new();
    let drag = state.drag().unwrap_or(&empty);

    if rule.drag && !check_cost(&rule.cost, drag, DRAG, ops) {
        return Ok(false);
    }

    for tag in rule.gain.iter() {
        if !drag.contains_value(tag.value()) && tag.op() == TagOp::RemoveOrAppend {
            ops.push(Operation::assert_no_tag(tag.value(), DRAG));
            ops.push(Operation::append_tag(tag.value(), DRAG));
        } else if rule.cost.contains_value(tag.value()) {
            return Err(ScriptError::syntax(
                Phase::Rule,
                format!("gain '{tag}' of [{}] is also paid as cost", rule.match_tag),
            ));
        } else {
            return Ok(false);
        }
    }

    for tag in rule.context.iter() {
        let accepted = if tag.is_comparison() {
            check_comparison(tag, state, ops)
        } else {
            check_context(tag, scene, state, ops)
        };
        if !accepted {
            return Ok(false);
        }
    }

    for tag in rule.payload.iter() {
        if !check_payload(tag, scene, state, ops) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `>=`, `<=` and range context tags, tested against every meter in the scenes.
fn check_comparison(tag: &Tag, state: &WorldState, ops: &mut Vec<Operation>) -> bool {
    let meter = tag.meter();
    let mut found = false;

    for location in state.scenes() {
        for test in location.tags.iter() {
            let value = test.meter().value;
            let in_range = if tag.is_greater() {
                value < nolan_data::METER_MAX && value >= meter.start
            } else if tag.is_lower() {
                value <= meter.end && value > nolan_data::METER_MIN
            } else {
                value >= meter.start && value <= meter.end
            };
            if !(in_range && test.has_meter() && test.value().starts_with(tag.value())) {
                continue;
            }
            match tag.op() {
                TagOp::FailedIfPresent => return false,
                TagOp::SucceedIfPresent => ops.push(Operation::assert_tag_in(test.value(), &location.name)),
                TagOp::RemoveOrAppend => {},
            }
            found = true;
        }
    }

    found || tag.op() != TagOp::SucceedIfPresent
}

/// Plain context tags: present in some scene (the current one wins a tie) or absent from all.
fn check_context(tag: &Tag, scene: &str, state: &WorldState, ops: &mut Vec<Operation>) -> bool {
    let mut found: Option<&str> = None;
    for location in state.scenes() {
        if location.tags.contains_value(tag.value()) && (found.is_none() || location.name.eq_ignore_ascii_case(scene)) {
            found = Some(&location.name);
        }
        if tag.op() == TagOp::FailedIfPresent {
            ops.push(Operation::assert_no_tag(tag.value(), &location.name));
        }
    }

    match (tag.op(), found) {
        (TagOp::RemoveOrAppend, Some(at)) => {
            ops.push(Operation::assert_tag_in(tag.value(), at));
            ops.push(Operation::remove_tag(tag.value(), at));
            true
        },
        (TagOp::SucceedIfPresent, Some(at)) => {
            ops.push(Operation::assert_tag_in(tag.value(), at));
            true
        },
        (TagOp::FailedIfPresent, None) => true,
        _ => false,
    }
}

/// Payload tags land at their own location, or in the scene when unqualified.
fn check_payload(tag: &Tag, scene: &str, state: &WorldState, ops: &mut Vec<Operation>) -> bool {
    if tag.op() != TagOp::RemoveOrAppend || tag.location().is_some_and(is_drag) {
        return false;
    }
    let target = tag.location().unwrap_or(scene);

    for location in state.scenes() {
        if location.tags.contains_value(tag.value()) {
            if location.name.eq_ignore_ascii_case(target) {
                return false;
            }
            continue;
        }
        ops.push(Operation::assert_no_tag(tag.value(), &location.name));
    }
    ops.push(Operation::append_tag(tag.value(), target));
    true
}

/// Expand the sugar of `rule` against `state`, appending concrete rules to
/// `rulebook`.
///
/// A rule without sugar is appended as is. Otherwise the fields expand in
/// the order match, context, cost, payload, gain: the first three against
/// each location in turn, payload and gain against the tags the rule
/// consumes. Expansions equal to a rule already in `rulebook` are dropped.
///
/// # Errors
/// Propagates the parse error of a rebuilt tag.
pub fn resolve_syntax(rule: &Rule, state: &WorldState, rulebook: &mut Vec<Rule>) -> Result<()> {
    if !rule.contains_sugar() {
        rulebook.push(rule.clone());
        return Ok(());
    }

    let matches = if rule.match_tag.contains_sugar() {
        let mut tags = Vec::new();
        for location in state.locations() {
            tags.extend(rule.match_tag.resolve_syntax(&location.tags)?);
        }
        tags
    } else {
        vec![rule.match_tag.clone()]
    };

    let before = rulebook.len();
    for matched in matches {
        for context in expand_per_location(&rule.context, state)? {
            for cost in expand_per_location(&rule.cost, state)? {
                let consumed = TagSet::concat([&TagSet::from_iter([matched.clone()]), &context, &cost]);
                for payload in expand_against(&rule.payload, &consumed)? {
                    for gain in expand_against(&rule.gain, &consumed)? {
                        let concrete = rule.with_sets(matched.clone(), context.clone(), cost.clone(), payload.clone(), gain);
                        if !rulebook.contains(&concrete) {
                            rulebook.push(concrete);
                        }
                    }
                }
            }
        }
    }
    debug!("[{}] expanded into {} rules", rule.match_tag, rulebook.len() - before);
    Ok(())
}

fn expand_per_location(set: &TagSet, state: &WorldState) -> Result<Vec<TagSet>> {
    if !set.contains_sugar() {
        return Ok(vec![set.clone()]);
    }
    let mut sets = Vec::new();
    for location in state.locations() {
        sets.extend(set.resolve_syntax(&location.tags)?);
    }
    Ok(sets)
}

fn expand_against(set: &TagSet, pool: &TagSet) -> Result<Vec<TagSet>> {
    if set.contains_sugar() { set.resolve_syntax(pool) } else { Ok(vec![set.clone()]) }
}

/// Expand every rule of `rules` in order into one concrete rulebook.
///
/// # Errors
/// See [`resolve_syntax`].
pub fn expand_rulebook(rules: &[Rule], state: &WorldState) -> Result<Vec<Rule>> {
    let mut rulebook = Vec::with_capacity(rules.len());
    for rule in rules {
        resolve_syntax(rule, state, &mut rulebook)?;
    }
    Ok(rulebook)
}

/// Everything the player may do in `scene` right now.
///
/// ```
/// use nolan_data::{Location, Rule, Tag, TagSet, WorldState};
/// use nolan_engine::compute;
///
/// let state = WorldState::from_locations([Location::new("HOME", TagSet::parse("door;king").unwrap())]);
/// let rules = [Rule::new(Tag::parse("?king").unwrap())];
/// let actions = compute("HOME", &state, &rules).unwrap();
/// assert!(actions.get("poke the king. ").is_some());
/// ```
///
/// # Errors
/// See [`accept`] and [`resolve_syntax`].
pub fn compute(scene: &str, state: &WorldState, rules: &[Rule]) -> Result<Actions> {
    let mut actions = Actions::new();
    for rule in expand_rulebook(rules, state)? {
        if let Some(accepted) = accept(&rule, scene, state)? {
            debug!("accepted {rule}");
            actions.push(Action {
                description: rule.description(),
                text: accepted.text,
                operations: accepted.operations,
            });
        }
    }
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nolan_data::{ErrorKind, Location, OperationKind};

    fn state(locations: &[(&str, &str)]) -> WorldState {
        WorldState::from_locations(
            locations
                .iter()
                .map(|(name, tags)| Location::new(*name, TagSet::parse(tags).unwrap())),
        )
    }

    fn rule(match_tag: &str) -> Rule {
        Rule::new(Tag::parse(match_tag).unwrap())
    }

    fn kinds(ops: &[Operation]) -> Vec<(OperationKind, &str, &str)> {
        ops.iter().map(|op| (op.kind, op.tag.as_str(), op.location.as_str())).collect()
    }

    #[test]
    fn poke_asserts_the_match() {
        let world = state(&[("HOME", "door;hero;king")]);
        let mut talk = rule("?king");
        talk.text = Some("TALK".into());
        let accepted = accept(&talk, "home", &world).unwrap().unwrap();
        assert_eq!(accepted.text.as_deref(), Some("TALK"));
        assert_eq!(kinds(&accepted.operations), [(OperationKind::AssertTagIn, "king", "HOME")]);
    }

    #[test]
    fn rejects_missing_scene_and_missing_match() {
        let world = state(&[("HOME", "door;hero;king")]);
        assert!(accept(&rule("?king"), "CAVE", &world).unwrap().is_none());
        assert!(accept(&rule("?dragon"), "HOME", &world).unwrap().is_none());
        assert!(accept(&rule("!king"), "HOME", &world).unwrap().is_none());
    }

    #[test]
    fn qualified_match_moves_the_scene() {
        let world = state(&[("HOME", "door;hero;king"), ("CAVE", "castle;dragon")]);
        let accepted = accept(&rule("?door<CAVE>"), "HOME", &world).unwrap().unwrap();
        assert_eq!(
            kinds(&accepted.operations),
            [(OperationKind::GotoScene, "", "CAVE"), (OperationKind::AssertTagIn, "door", "HOME")]
        );
        assert!(accept(&rule("?door<CAVE>"), "CAVE", &world).unwrap().is_none());
    }

    #[test]
    fn qualified_match_needs_its_location() {
        let world = state(&[("HOME", "door;hero;king")]);
        assert!(accept(&rule("?door<CAVE>"), "HOME", &world).unwrap().is_none());
        assert!(compute("HOME", &world, &[rule("?door<CAVE>")]).unwrap().is_empty());

        let lowercase = state(&[("HOME", "door"), ("CAVE", "dragon")]);
        let accepted = accept(&rule("?door<cave>"), "HOME", &lowercase).unwrap().unwrap();
        assert_eq!(kinds(&accepted.operations)[0], (OperationKind::GotoScene, "", "CAVE"));
    }

    #[test]
    fn drop_cost_is_paid_in_the_scene() {
        let world = state(&[("HOME", "door;hero;king"), ("CAVE", "castle;dragon")]);
        let mut open = rule("?door<CAVE>");
        open.drag = false;
        open.cost = TagSet::parse("hero").unwrap();
        open.context = TagSet::parse("dragon<CAVE>").unwrap();
        open.payload = TagSet::parse("dragon.fire<CAVE>;hero.fire<CAVE>").unwrap();

        let accepted = accept(&open, "HOME", &world).unwrap().unwrap();
        let next = world.apply(&accepted.operations).unwrap();
        assert_eq!(next.tags("HOME").unwrap().to_string(), "door;king");
        assert_eq!(next.tags("CAVE").unwrap().to_string(), "castle;dragon.fire;hero.fire");

        let without_hero = state(&[("HOME", "door;king"), ("CAVE", "castle;dragon")]);
        assert!(accept(&open, "HOME", &without_hero).unwrap().is_none());
    }

    #[test]
    fn drag_cost_and_gain_go_through_drag() {
        let world = state(&[("SHOP", "counter"), ("DRAG", "coin")]);
        let mut buy = rule("?counter");
        buy.cost = TagSet::parse("coin").unwrap();
        buy.gain = TagSet::parse("bread").unwrap();
        let accepted = accept(&buy, "SHOP", &world).unwrap().unwrap();
        let next = world.apply(&accepted.operations).unwrap();
        assert_eq!(next.drag().unwrap().to_string(), "bread");

        let broke = state(&[("SHOP", "counter")]);
        assert!(accept(&buy, "SHOP", &broke).unwrap().is_none());
    }

    #[test]
    fn gain_already_held_rejects_or_fails() {
        let world = state(&[("SHOP", "counter"), ("DRAG", "bread;coin")]);
        let mut buy = rule("?counter");
        buy.gain = TagSet::parse("bread").unwrap();
        assert!(accept(&buy, "SHOP", &world).unwrap().is_none());

        buy.cost = TagSet::parse("?bread").unwrap();
        let err = accept(&buy, "SHOP", &world).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SyntaxError);
        assert_eq!(err.phase, Phase::Rule);
    }

    #[test]
    fn context_prefers_the_scene_on_ties() {
        let world = state(&[("HOME", "king;torch"), ("CAVE", "torch")]);
        let mut grab = rule("?king");
        grab.context = TagSet::parse("torch").unwrap();
        let ops = accept(&grab, "HOME", &world).unwrap().unwrap().operations;
        assert_eq!(ops[1..], [Operation::assert_tag_in("torch", "HOME"), Operation::remove_tag("torch", "HOME")]);

        grab.context = TagSet::parse("!torch").unwrap();
        assert!(accept(&grab, "HOME", &world).unwrap().is_none());
        grab.context = TagSet::parse("!dragon").unwrap();
        let ops = accept(&grab, "HOME", &world).unwrap().unwrap().operations;
        assert_eq!(ops.len(), 3);
    }

    #[test]
    fn comparison_context_scans_meters() {
        let world = state(&[("HOME", "king;gold.7"), ("DRAG", "gold.99")]);
        let mut pay = rule("?king");
        pay.context = TagSet::parse("?gold.>=5").unwrap();
        let ops = accept(&pay, "HOME", &world).unwrap().unwrap().operations;
        assert_eq!(ops.last(), Some(&Operation::assert_tag_in("gold.7", "HOME")));

        pay.context = TagSet::parse("?gold.>=8").unwrap();
        assert!(accept(&pay, "HOME", &world).unwrap().is_none());
        pay.context = TagSet::parse("!gold.<=9").unwrap();
        assert!(accept(&pay, "HOME", &world).unwrap().is_none());
        pay.context = TagSet::parse("?gold.1..7").unwrap();
        assert!(accept(&pay, "HOME", &world).unwrap().is_some());
    }

    #[test]
    fn payload_already_in_place_rejects() {
        let world = state(&[("HOME", "king;sword"), ("CAVE", "crown")]);
        let mut give = rule("?king");
        give.payload = TagSet::parse("sword").unwrap();
        assert!(accept(&give, "HOME", &world).unwrap().is_none());

        give.payload = TagSet::parse("crown").unwrap();
        let ops = accept(&give, "HOME", &world).unwrap().unwrap().operations;
        assert_eq!(ops.last(), Some(&Operation::append_tag("crown", "HOME")));
        assert!(!ops.contains(&Operation::assert_no_tag("crown", "CAVE")));

        give.payload = TagSet::parse("crown<DRAG>").unwrap();
        assert!(accept(&give, "HOME", &world).unwrap().is_none());
    }

    #[test]
    fn wildcard_match_expands_per_location() {
        let world = state(&[("ARMORY", "weapon.sword;weapon.axe")]);
        let rulebook = expand_rulebook(&[rule("?weapon.*")], &world).unwrap();
        let heads: Vec<String> = rulebook.iter().map(|r| r.match_tag.to_string()).collect();
        assert_eq!(heads, ["?weapon.axe", "?weapon.sword"]);
        assert_eq!(expand_rulebook(&[rule("?weapon.*")], &world).unwrap(), rulebook);
    }

    #[test]
    fn increment_payload_counts_from_the_cost() {
        let world = state(&[("BANK", "teller"), ("DRAG", "gold.5")]);
        let mut deposit = rule("?teller");
        deposit.cost = TagSet::parse("gold.*").unwrap();
        deposit.gain = TagSet::parse("gold.++").unwrap();
        let rulebook = expand_rulebook(&[deposit], &world).unwrap();
        assert_eq!(rulebook.len(), 1);
        assert_eq!(rulebook[0].cost.to_string(), "gold.5");
        assert_eq!(rulebook[0].gain.to_string(), "gold.6");

        let actions = compute("BANK", &world, &rulebook).unwrap();
        let action = actions.iter().next().unwrap();
        assert_eq!(world.apply(&action.operations).unwrap().drag().unwrap().to_string(), "gold.6");
    }

    #[test]
    fn duplicate_descriptions_are_suffixed() {
        let world = state(&[("HOME", "poke")]);
        let mut second = rule("?poke");
        second.context = TagSet::parse("!dragon").unwrap();
        let actions = compute("HOME", &world, &[rule("?poke"), second]).unwrap();
        let names: Vec<&str> = actions.iter().map(|a| a.description.as_str()).collect();
        assert_eq!(names, ["Poke the poke. ", "Poke the poke.  duplicate"]);
        assert!(actions.get("POKE THE POKE.  DUPLICATE").is_some());
    }
}
