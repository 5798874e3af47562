//! Script compilation: classified lines in, tapes out.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info};
use nolan_data::{LOOP, ONCE, Phase, Result, RouteNode, Rule, ScriptError, Tag, TagSet, Tape, WorldState};

use crate::lines::{LineKind, ScriptLine, split_lines};
use crate::parser::{RuleLine, StateLine, TextLine, parse_rule_line, parse_state_line, parse_text_line};
use crate::registry::TagRegistry;
use crate::route::RouteBuilder;
use crate::text_bank::{SequenceKind, TextBank};

/// Route root used when no rule with text precedes a route block.
pub const FALLBACK_ROUTE: &str = "FAIL";

/// What one source line compiled into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    StateDecl(String),
    Rule(Rule),
    /// Keys of the lines a `##` line added.
    Text(Vec<String>),
    /// Root name of a route block.
    Route(String),
    Comment(String),
}

/// Every tape of a script, in source order.
#[derive(Debug, Clone, Default)]
pub struct CompiledScript {
    pub tapes: Vec<Tape>,
    /// Keyed by the 1-based line number that opened the part.
    pub parts: BTreeMap<usize, Part>,
    pub registry: TagRegistry,
}

impl CompiledScript {
    /// The tape labelled `label`, ignoring case.
    pub fn tape(&self, label: &str) -> Option<&Tape> {
        self.tapes.iter().find(|tape| tape.label.eq_ignore_ascii_case(label))
    }
}

/// Compile Nolan script source into tapes.
///
/// ```
/// let script = "== INTRO [HOME, hero;king]\n++ ()-[?king]->() #HI Bonjour!";
/// let compiled = nolan_script::compile_script(script).unwrap();
/// let tape = compiled.tape("intro").unwrap();
/// assert_eq!(tape.rules.len(), 1);
/// assert_eq!(tape.text.line("HI").unwrap(), "Bonjour!");
/// ```
///
/// # Errors
/// The first [`ScriptError`] met; its message starts with the source line.
/// Nothing is returned for a script that fails anywhere.
pub fn compile_script(source: &str) -> Result<CompiledScript> {
    let mut builder = ScriptBuilder::default();
    for line in split_lines(source)? {
        builder.push_line(&line)?;
    }
    builder.finish()
}

/// Accumulates the tape currently being written.
#[derive(Debug)]
struct TapeBuilder {
    label: String,
    state: WorldState,
    rules: Vec<Rule>,
    bank: TextBank,
    routes: BTreeMap<String, RouteNode>,
}

impl TapeBuilder {
    fn new(label: String, state: WorldState) -> Self {
        Self {
            label,
            state,
            rules: Vec::new(),
            bank: TextBank::new(),
            routes: BTreeMap::new(),
        }
    }

    /// Seal the tape; sequence counters join the initial state.
    fn finish(self) -> Result<Tape> {
        let (loops, onces) = self.bank.sequences();
        let mut state = self.state;
        for (location, counters) in [(LOOP, loops), (ONCE, onces)] {
            if counters.is_empty() {
                continue;
            }
            let tags = counters
                .iter()
                .map(|counter| Tag::parse(counter))
                .collect::<Result<TagSet>>()
                .map_err(|e| e.in_phase(Phase::Text))?;
            state = state.with_location(location, tags);
        }

        let text = self.bank.finish(self.routes);
        info!(
            "compiled tape '{}': {} rules, {} lines, {} routes",
            self.label,
            self.rules.len(),
            text.lines.values().map(Vec::len).sum::<usize>(),
            text.routes.len()
        );

        let mut tape = Tape::new(self.label, state);
        tape.rules = self.rules;
        tape.text = text;
        Ok(tape)
    }
}

#[derive(Debug, Default)]
struct ScriptBuilder {
    tapes: Vec<Tape>,
    /// Lowercased labels seen so far.
    labels: HashSet<String>,
    /// Route node names across the whole script.
    route_names: HashSet<String>,
    parts: BTreeMap<usize, Part>,
    registry: TagRegistry,
    current: Option<TapeBuilder>,
    /// Open route block and the line it started on.
    route: Option<(usize, RouteBuilder)>,
}

impl ScriptBuilder {
    fn push_line(&mut self, line: &ScriptLine) -> Result<()> {
        if line.kind != LineKind::Route {
            self.flush_route()?;
        }
        self.read_line(line).map_err(|e| e.at_line(line.number))
    }

    fn read_line(&mut self, line: &ScriptLine) -> Result<()> {
        match line.kind {
            LineKind::State => self.open_tape(line),
            LineKind::Rule => {
                let tape = open_tape_for(&mut self.current, "rule")?;
                let RuleLine { rule, text } = parse_rule_line(&line.content)?;
                if let Some(text) = text {
                    for sentence in &text.sentences {
                        tape.bank.append_line(&text.name, sentence)?;
                    }
                }
                self.registry.record_rule(&rule);
                debug!("rule {rule}");
                tape.rules.push(rule.clone());
                self.parts.insert(line.number, Part::Rule(rule));
                Ok(())
            },
            LineKind::Route => {
                let tape = open_tape_for(&mut self.current, "route")?;
                if self.route.is_none() {
                    let root = tape
                        .rules
                        .last()
                        .and_then(|rule| rule.text.clone())
                        .unwrap_or_else(|| FALLBACK_ROUTE.to_string());
                    self.parts.insert(line.number, Part::Route(root.clone()));
                    self.route = Some((line.number, RouteBuilder::new(root)));
                }
                if let Some((_, builder)) = self.route.as_mut() {
                    builder.push_line(&line.content, &mut tape.bank)?;
                }
                Ok(())
            },
            LineKind::Text => {
                let tape = open_tape_for(&mut self.current, "text")?;
                let TextLine { name, sentences, once } = parse_text_line(&line.content)?;
                let keys = if sentences.len() > 1 {
                    let parts: Vec<&str> = sentences.iter().map(String::as_str).collect();
                    let kind = if once { SequenceKind::Once } else { SequenceKind::Loop };
                    tape.bank.append_sequence(&name, &parts, kind)?
                } else {
                    tape.bank.append_line(&name, sentences.first().map_or("", String::as_str))?
                };
                self.parts.insert(line.number, Part::Text(keys));
                Ok(())
            },
            LineKind::Comment => {
                self.parts.insert(line.number, Part::Comment(line.content.clone()));
                Ok(())
            },
            LineKind::Goal | LineKind::Step => {
                debug!("line {}: '{}' ignored", line.number, line.content);
                Ok(())
            },
        }
    }

    fn open_tape(&mut self, line: &ScriptLine) -> Result<()> {
        self.flush_tape()?;
        let StateLine { label, state } = parse_state_line(&line.content)?;
        if !self.labels.insert(label.to_lowercase()) {
            return Err(ScriptError::duplicate(Phase::Tape, format!("tape '{label}' already exists")));
        }
        self.registry.record_state(&state);
        self.parts.insert(line.number, Part::StateDecl(label.clone()));
        self.current = Some(TapeBuilder::new(label, state));
        Ok(())
    }

    /// Build the open route block into the current tape.
    fn flush_route(&mut self) -> Result<()> {
        let Some((start, builder)) = self.route.take() else {
            return Ok(());
        };
        self.insert_route(builder).map_err(|e| e.at_line(start))
    }

    fn insert_route(&mut self, builder: RouteBuilder) -> Result<()> {
        let tape = open_tape_for(&mut self.current, "route")?;
        if self.route_names.contains(builder.root()) {
            return Err(ScriptError::duplicate(
                Phase::Route,
                format!("route '{}' already exists", builder.root()),
            ));
        }

        for (name, node) in builder.build()? {
            if !self.route_names.insert(name.clone()) {
                return Err(ScriptError::duplicate(Phase::Route, format!("route node '{name}' already exists")));
            }
            for stitch in &node.flow {
                self.registry.record_stitch(stitch);
            }
            tape.routes.insert(name, node);
        }
        Ok(())
    }

    fn flush_tape(&mut self) -> Result<()> {
        if let Some(tape) = self.current.take() {
            self.tapes.push(tape.finish()?);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<CompiledScript> {
        self.flush_route()?;
        self.flush_tape()?;
        info!("compiled {} tapes, {} tag identifiers", self.tapes.len(), self.registry.len());
        Ok(CompiledScript {
            tapes: self.tapes,
            parts: self.parts,
            registry: self.registry,
        })
    }
}

fn open_tape_for<'a>(current: &'a mut Option<TapeBuilder>, what: &str) -> Result<&'a mut TapeBuilder> {
    current
        .as_mut()
        .ok_or_else(|| ScriptError::syntax(Phase::Tape, format!("{what} line before any state declaration")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nolan_data::ErrorKind;

    #[test]
    fn every_tape_keeps_its_own_rules() {
        let script = "\
== FIRST [HOME, hero]
++ ()-[?hero]->() #HI Hello
== SECOND [ROAD, cart]
++ ()-[?cart]->()
++ (hero)-[?cart]->()
";
        let compiled = compile_script(script).unwrap();
        assert_eq!(compiled.tapes.len(), 2);
        assert_eq!(compiled.tapes[0].label, "FIRST");
        assert_eq!(compiled.tapes[0].rules.len(), 1);
        assert_eq!(compiled.tapes[1].rules.len(), 2);
        assert!(compiled.tapes[1].text.lines.is_empty());
        assert_eq!(compiled.parts[&1], Part::StateDecl("FIRST".into()));
        assert!(matches!(compiled.parts[&4], Part::Rule(_)));
    }

    #[test]
    fn duplicate_labels_ignore_case() {
        let err = compile_script("== INTRO [HOME, a]\n== intro [HOME, b]").unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateKey);
        assert_eq!(err.phase, Phase::Tape);
        assert!(err.message.starts_with("line 2:"));
    }

    #[test]
    fn lines_before_a_state_are_rejected() {
        let err = compile_script("++ ()-[?hero]->()\n== A [HOME, hero]").unwrap_err();
        assert_eq!(err.kind, ErrorKind::SyntaxError);
        assert_eq!(err.phase, Phase::Tape);

        let compiled = compile_script("// intro\n== A [HOME, hero]").unwrap();
        assert_eq!(compiled.parts[&1], Part::Comment("intro".into()));
    }

    #[test]
    fn route_without_rule_text_uses_fallback_root() {
        let compiled = compile_script("== A [HOME, hero]\n++ ()-[?hero]->()\n-- [Yes] please.").unwrap();
        let tape = &compiled.tapes[0];
        assert!(tape.text.route(FALLBACK_ROUTE).is_some());
        assert!(tape.text.route("FAIL-1").is_some());
        assert_eq!(compiled.parts[&3], Part::Route(FALLBACK_ROUTE.into()));
    }

    #[test]
    fn route_roots_are_unique_across_tapes() {
        let script = "\
== A [HOME, hero]
++ ()-[?hero]->() #TALK Hi
-- [Yes] please.
== B [HOME, hero]
++ ()-[?hero]->() #TALK Hi
-- [No] thanks.
";
        let err = compile_script(script).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateKey);
        assert_eq!(err.phase, Phase::Route);
        assert!(err.message.starts_with("line 6:"));
    }

    #[test]
    fn text_lines_declare_sequences() {
        let script = "\
== A [HOME, hero]
## IDLE Hm.|Well?
## INTRO First.&Again.
## GREET Bonjour.
";
        let compiled = compile_script(script).unwrap();
        let tape = &compiled.tapes[0];
        assert_eq!(tape.initial_state.tags(LOOP).unwrap().to_string(), "IDLE_0");
        assert_eq!(tape.initial_state.tags(ONCE).unwrap().to_string(), "INTRO_0");
        assert_eq!(tape.text.lines["IDLE"], ["Hm.", "Well?"]);
        assert_eq!(compiled.parts[&4], Part::Text(vec!["GREET".into()]));
    }

    #[test]
    fn gain_paid_as_cost_fails_the_compile() {
        let err = compile_script("== A [HOME, chest]\n++ {gold}-[chest]->{gold}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::SyntaxError);
        assert_eq!(err.phase, Phase::Rule);
        assert!(err.message.starts_with("line 2:"));
    }

    #[test]
    fn registry_collects_state_rule_and_route_tags() {
        let script = "\
== A [HOME, hero;king]
++ (?hero)-[?king]->() #TALK Hi
-- (?crown) [Yes] please.
--> (sword)
";
        let compiled = compile_script(script).unwrap();
        assert_eq!(compiled.registry.sorted(), ["crown", "hero", "king", "sword"]);
    }
}
