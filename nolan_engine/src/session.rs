//! A playthrough of one tape: the turn history and the dialogue cursor.
//!
//! Every performed action or followed choice pushes a [`Frame`], so undo is
//! a pop. Sequence counters live in the world state and rewind with it.

use log::{debug, info};
use nolan_data::{Phase, Result, RouteNode, ScriptError, Tape, WorldState, is_reserved};

use crate::rules::{Action, Actions, compute};
use crate::sequence::{read_key, read_name};
use crate::stitch::{FlowStep, accept_flow};

/// Gotos followed in a row before a route is considered circular.
const MAX_HOPS: usize = 32;

/// The world after one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub state: WorldState,
    pub scene: String,
    /// Route node whose choices are on offer, if any.
    pub node: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Playthrough {
    tape: Tape,
    frames: Vec<Frame>,
}

impl Playthrough {
    /// Start `tape` in `scene`, or in its first location that is not reserved.
    ///
    /// # Errors
    /// `KeyNotFound` (phase Play) when the scene does not exist.
    pub fn new(tape: Tape, scene: Option<&str>) -> Result<Self> {
        let state = tape.initial_state.clone();
        let scene = match scene {
            Some(name) => state.location(name).map(|l| l.name.clone()).ok_or_else(|| {
                ScriptError::not_found(Phase::Play, format!("tape '{}' has no location '{name}'", tape.label))
            })?,
            None => state
                .locations()
                .iter()
                .find(|l| !is_reserved(&l.name))
                .map(|l| l.name.clone())
                .ok_or_else(|| ScriptError::empty(Phase::Play, format!("tape '{}' has no scene", tape.label)))?,
        };
        info!("starting '{}' in {scene}", tape.label);
        Ok(Self {
            tape,
            frames: vec![Frame {
                state,
                scene,
                node: None,
            }],
        })
    }

    fn current(&self) -> &Frame {
        // never empty: `undo` keeps the first frame
        &self.frames[self.frames.len() - 1]
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn state(&self) -> &WorldState {
        &self.current().state
    }

    pub fn scene(&self) -> &str {
        &self.current().scene
    }

    /// Turns played since the start.
    pub fn turn(&self) -> usize {
        self.frames.len() - 1
    }

    /// The route node whose choices are on offer.
    pub fn node(&self) -> Option<(&str, &RouteNode)> {
        let name = self.current().node.as_deref()?;
        self.tape.text.route(name).map(|node| (name, node))
    }

    pub fn route(&self, name: &str) -> Option<&RouteNode> {
        self.tape.text.route(name)
    }

    /// # Errors
    /// See [`compute`].
    pub fn actions(&self) -> Result<Actions> {
        compute(self.scene(), self.state(), &self.tape.rules)
    }

    /// Choices of the current node that apply, with their index in the node's flow.
    pub fn flow(&self) -> Vec<(usize, FlowStep)> {
        let Some((_, node)) = self.node() else {
            return Vec::new();
        };
        accept_flow(&node.flow, self.scene(), self.state())
    }

    /// Play an action and return the keys of the lines it shows.
    ///
    /// # Errors
    /// Operation or text lookup errors; the history is left untouched.
    pub fn perform(&mut self, action: &Action) -> Result<Vec<String>> {
        let frame = self.current();
        let (state, scene) = frame.state.apply_in_scene(&action.operations, &frame.scene)?;
        let mut next = Frame {
            state,
            scene,
            node: None,
        };
        let keys = match &action.text {
            Some(name) => self.enter(&mut next, name)?,
            None => Vec::new(),
        };
        debug!("performed '{}' -> {} lines", action.description, keys.len());
        self.frames.push(next);
        Ok(keys)
    }

    /// Take a dialogue choice and return the keys of the lines it shows.
    ///
    /// # Errors
    /// Operation or text lookup errors; the history is left untouched.
    pub fn follow(&mut self, step: &FlowStep) -> Result<Vec<String>> {
        let frame = self.current();
        let (state, scene) = frame.state.apply_in_scene(&step.operations, &frame.scene)?;
        let mut next = Frame {
            state,
            scene,
            node: None,
        };
        let keys = self.enter(&mut next, &step.next)?;
        self.frames.push(next);
        Ok(keys)
    }

    /// Walk from `name` through gotos until a node offers choices or the text ends.
    fn enter(&self, frame: &mut Frame, name: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut target = name.to_string();

        for _ in 0..MAX_HOPS {
            let Some(node) = self.tape.text.route(&target) else {
                let reading = read_name(&self.tape.text, &frame.state, &target)?;
                frame.state = frame.state.apply(&reading.operations)?;
                keys.extend(reading.keys);
                return Ok(keys);
            };

            for key in node.reading_order() {
                let reading = read_key(&self.tape.text, &frame.state, key)?;
                frame.state = frame.state.apply(&reading.operations)?;
                keys.extend(reading.keys);
            }
            if !node.flow.is_empty() {
                frame.node = Some(target);
                return Ok(keys);
            }
            match &node.goto {
                Some(goto) => target.clone_from(goto),
                None => return Ok(keys),
            }
        }

        Err(ScriptError::out_of_range(
            Phase::Play,
            format!("route '{name}' follows more than {MAX_HOPS} gotos"),
        ))
    }

    /// The line `key` shows right now.
    ///
    /// # Errors
    /// `KeyNotFound` or `OutOfRange` (phase Text) for an unknown key.
    pub fn text(&self, key: &str) -> Result<String> {
        let reading = read_key(&self.tape.text, self.state(), key)?;
        let shown = reading.keys.first().map_or(key, String::as_str);
        self.tape.text.line(shown).map(str::to_string)
    }

    /// The line stored under a concrete line key, as returned by `perform` and `follow`.
    ///
    /// # Errors
    /// `KeyNotFound` or `OutOfRange` (phase Text) for an unknown key.
    pub fn line<'a>(&'a self, key: &'a str) -> Result<&'a str> {
        self.tape.text.line(key)
    }

    /// Step back one turn. The starting frame is never popped.
    pub fn undo(&mut self) -> bool {
        if self.frames.len() < 2 {
            return false;
        }
        self.frames.pop();
        true
    }
}
