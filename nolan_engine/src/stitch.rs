//! Dialogue choices: which stitches of a route node the player may take.

use nolan_data::{DRAG, Operation, Stitch, TagOp, TagSet, WorldState, is_drag};

/// A choice that applies: where it leads and what it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStep {
    pub next: String,
    pub operations: Vec<Operation>,
}

/// Test a stitch in `scene`. Stitch costs are always paid from DRAG.
pub fn accept_stitch(stitch: &Stitch, scene: &str, state: &WorldState) -> Option<FlowStep> {
    let empty = TagSet::new();
    let drag = state.drag().unwrap_or(&empty);
    let mut ops = Vec::new();

    for tag in stitch.cost.iter() {
        let present = drag.contains_value(tag.value());
        match tag.op() {
            TagOp::RemoveOrAppend if present => {
                ops.push(Operation::assert_tag_in(tag.value(), DRAG));
                ops.push(Operation::remove_tag(tag.value(), DRAG));
            },
            TagOp::SucceedIfPresent if present => ops.push(Operation::assert_tag_in(tag.value(), DRAG)),
            TagOp::FailedIfPresent if !present => ops.push(Operation::assert_no_tag(tag.value(), DRAG)),
            _ => return None,
        }
    }

    for tag in stitch.gain.iter() {
        if drag.contains_value(tag.value()) || tag.op() != TagOp::RemoveOrAppend {
            return None;
        }
        ops.push(Operation::assert_no_tag(tag.value(), DRAG));
        ops.push(Operation::append_tag(tag.value(), DRAG));
    }

    for tag in stitch.context.iter() {
        let mut found: Option<&str> = None;
        for location in state.scenes() {
            if location.tags.contains_value(tag.value()) {
                if found.is_some() {
                    return None;
                }
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
            },
            (TagOp::SucceedIfPresent, Some(at)) => ops.push(Operation::assert_tag_in(tag.value(), at)),
            (TagOp::FailedIfPresent, None) => {},
            _ => return None,
        }
    }

    for tag in stitch.payload.iter() {
        if tag.op() != TagOp::RemoveOrAppend || tag.location().is_some_and(is_drag) {
            return None;
        }
        for location in state.scenes() {
            if location.tags.contains_value(tag.value()) {
                return None;
            }
            ops.push(Operation::assert_no_tag(tag.value(), &location.name));
        }
        ops.push(Operation::append_tag(tag.value(), tag.location().unwrap_or(scene)));
    }

    Some(FlowStep {
        next: stitch.next.clone(),
        operations: ops,
    })
}

/// Every stitch of `flow` that applies, with its index in `flow`.
pub fn accept_flow(flow: &[Stitch], scene: &str, state: &WorldState) -> Vec<(usize, FlowStep)> {
    flow.iter()
        .enumerate()
        .filter_map(|(index, stitch)| accept_stitch(stitch, scene, state).map(|step| (index, step)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nolan_data::Location;

    fn state(locations: &[(&str, &str)]) -> WorldState {
        WorldState::from_locations(
            locations
                .iter()
                .map(|(name, tags)| Location::new(*name, TagSet::parse(tags).unwrap())),
        )
    }

    fn stitch(payload: &str) -> Stitch {
        let mut stitch = Stitch::new("TALK-1S", "TALK-1");
        stitch.payload = TagSet::parse(payload).unwrap();
        stitch
    }

    #[test]
    fn unqualified_payload_lands_in_the_scene() {
        let world = state(&[("HOME", "door;hero;king"), ("CAVE", "castle;dragon")]);
        let step = accept_stitch(&stitch("sword"), "HOME", &world).unwrap();
        assert_eq!(step.next, "TALK-1");
        let next = world.apply(&step.operations).unwrap();
        assert_eq!(next.tags("HOME").unwrap().to_string(), "door;hero;king;sword");
    }

    #[test]
    fn payload_anywhere_blocks_the_choice() {
        let world = state(&[("HOME", "king"), ("CAVE", "sword")]);
        assert!(accept_stitch(&stitch("sword"), "HOME", &world).is_none());
        assert!(accept_stitch(&stitch("?shield"), "HOME", &world).is_none());
        assert!(accept_stitch(&stitch("shield<DRAG>"), "HOME", &world).is_none());
    }

    #[test]
    fn cost_and_gain_use_drag() {
        let world = state(&[("HOME", "king"), ("DRAG", "coin")]);
        let mut bribe = Stitch::new("BRIBE", "BRIBED");
        bribe.cost = TagSet::parse("coin").unwrap();
        bribe.gain = TagSet::parse("favour").unwrap();
        let step = accept_stitch(&bribe, "HOME", &world).unwrap();
        assert_eq!(world.apply(&step.operations).unwrap().drag().unwrap().to_string(), "favour");

        let broke = state(&[("HOME", "king;coin")]);
        assert!(accept_stitch(&bribe, "HOME", &broke).is_none());
    }

    #[test]
    fn context_must_be_unique() {
        let world = state(&[("HOME", "king;torch"), ("CAVE", "torch")]);
        let mut lit = Stitch::new("LIT", "LIGHT");
        lit.context = TagSet::parse("?torch").unwrap();
        assert!(accept_stitch(&lit, "HOME", &world).is_none());

        lit.context = TagSet::parse("?king").unwrap();
        assert!(accept_stitch(&lit, "HOME", &world).is_some());
        lit.context = TagSet::parse("!dragon").unwrap();
        let step = accept_stitch(&lit, "HOME", &world).unwrap();
        assert_eq!(step.operations.len(), 2);
    }

    #[test]
    fn flow_keeps_order_and_skips_refusals() {
        let world = state(&[("HOME", "king;sword")]);
        let flow = [stitch("sword"), Stitch::new("TALK-2S", "TALK-2"), Stitch::new("TALK-3S", "TALK-3")];
        let open: Vec<(usize, &str)> = accept_flow(&flow, "HOME", &world)
            .iter()
            .map(|(index, _)| (*index, flow[*index].choice.as_str()))
            .collect();
        assert_eq!(open, [(1, "TALK-2S"), (2, "TALK-3S")]);
    }
}
