//! Dialogue routes: depth-indented choice and answer lines turned into a
//! graph of named [`RouteNode`]s.
//!
//! The number of leading hyphens minus two is a line's depth. Even depths
//! are player choices, odd depths are answers, and a `>` right after the
//! hyphens marks a dead end that carries payload, gain and an optional goto.

use nolan_data::{Phase, Result, RouteNode, ScriptError, Stitch, TagSet};

use crate::parser::parse_tag_group;
use crate::text_bank::{SequenceKind, TextBank};

/// Cursor over the nesting of a route block; names nodes as it goes.
#[derive(Debug, Clone)]
pub struct RouteKnot {
    root: String,
    depth: usize,
    /// Sibling counter per choice level (`depth / 2`).
    counters: Vec<usize>,
}

impl RouteKnot {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            depth: 0,
            counters: vec![0],
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Move the cursor to a line at `depth`.
    ///
    /// # Errors
    /// `SyntaxError` (phase Route) when a dead end is deeper than the cursor or
    /// a line skips a level.
    pub fn advance(&mut self, depth: usize, dead_end: bool) -> Result<()> {
        if self.counters.len() <= depth / 2 {
            self.counters.resize(depth / 2 + 1, 0);
        }

        if dead_end {
            if depth > self.depth {
                return Err(self.indentation_error(depth));
            }
            self.depth = depth;
        } else if depth <= self.depth {
            self.depth = depth;
            if depth % 2 == 0 {
                self.counters[depth / 2] += 1;
            }
        } else {
            if depth != self.depth + 1 {
                return Err(self.indentation_error(depth));
            }
            self.depth = depth;
            if depth % 2 == 0 {
                self.counters[depth / 2] = 1;
            }
        }
        Ok(())
    }

    /// `root-c0[-c1...]`, with `-0` appended at odd depths.
    pub fn long_name(&self, depth: usize) -> String {
        let mut name = self.root.clone();
        for level in 0..=depth / 2 {
            name.push_str(&format!("-{}", self.counters.get(level).copied().unwrap_or(0)));
        }
        if depth % 2 == 1 {
            name.push_str("-0");
        }
        name
    }

    fn indentation_error(&self, depth: usize) -> ScriptError {
        ScriptError::syntax(
            Phase::Route,
            format!("route '{}': depth {depth} cannot follow depth {}", self.root, self.depth),
        )
    }
}

/// One parsed route line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLine {
    pub depth: usize,
    pub dead_end: bool,
    pub name: String,
    /// Text keys, last first. Dead ends have none.
    pub keys: Vec<String>,
    /// `(...)`: stitch context on a choice, payload on a dead end.
    pub context_or_payload: TagSet,
    /// `{...}`: stitch cost on a choice, gain on a dead end.
    pub cost_or_gain: TagSet,
    pub goto: Option<String>,
}

impl RouteLine {
    pub fn is_choice(&self) -> bool {
        self.depth % 2 == 0
    }
}

/// Collects the lines of one route block, then assembles its nodes.
#[derive(Debug)]
pub struct RouteBuilder {
    knot: RouteKnot,
    lines: Vec<RouteLine>,
}

impl RouteBuilder {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            knot: RouteKnot::new(root),
            lines: Vec::new(),
        }
    }

    pub fn root(&self) -> &str {
        self.knot.root()
    }

    pub fn lines(&self) -> &[RouteLine] {
        &self.lines
    }

    /// Parse one route line (hyphens included) and store its text in `bank`.
    ///
    /// # Errors
    /// `OutOfRange` for fewer than two hyphens, `SyntaxError` for bad
    /// indentation or a choice without `[short]` label, `NullOrEmpty` for a
    /// choice with nothing but its label, and text bank errors.
    pub fn push_line(&mut self, line: &str, bank: &mut TextBank) -> Result<()> {
        let line = line.trim();
        let hyphens = line.bytes().take_while(|b| *b == b'-').count();
        let depth = hyphens.checked_sub(2).ok_or_else(|| {
            ScriptError::out_of_range(Phase::Route, format!("route line '{line}' needs at least two hyphens"))
        })?;
        let rest = &line[hyphens..];
        let (dead_end, rest) = match rest.strip_prefix('>') {
            Some(rest) => (true, rest.trim()),
            None => (false, rest.trim()),
        };

        self.knot.advance(depth, dead_end)?;
        let name = self.knot.long_name(depth);
        let mut parsed = RouteLine {
            depth,
            dead_end,
            name,
            keys: Vec::new(),
            context_or_payload: TagSet::new(),
            cost_or_gain: TagSet::new(),
            goto: None,
        };

        if dead_end {
            let (payload, rest) = take_group(rest, '(', ')');
            let (gain, rest) = take_group(rest, '{', '}');
            parsed.context_or_payload = payload;
            parsed.cost_or_gain = gain;
            parsed.goto = (!rest.is_empty()).then(|| rest.trim_end().to_string());
        } else if parsed.is_choice() {
            let (context, rest) = take_group(rest, '(', ')');
            let (cost, rest) = take_group(rest, '{', '}');
            parsed.context_or_payload = context;
            parsed.cost_or_gain = cost;

            let (short, full) = split_choice(rest).ok_or_else(|| {
                ScriptError::syntax(
                    Phase::Route,
                    format!("route choice '{rest}' needs a [short] label"),
                )
            })?;
            if full.is_empty() {
                return Err(ScriptError::empty(
                    Phase::Route,
                    format!("route choice '{rest}' has a label but no text"),
                ));
            }
            bank.append_line(&format!("{}S", parsed.name), &short)?;
            parsed.keys = bank.append_line(&parsed.name, &full)?;
        } else {
            let sentences: Vec<&str> = rest.split('|').map(str::trim).collect();
            parsed.keys = if sentences.len() > 1 {
                bank.append_sequence(&parsed.name, &sentences, SequenceKind::Loop)?
            } else {
                bank.append_line(&parsed.name, rest)?
            };
        }

        self.lines.push(parsed);
        Ok(())
    }

    /// Assemble the nodes of the block: the root first, then answer nodes, then
    /// the nodes of choices that end the conversation.
    ///
    /// # Errors
    /// `OutOfRange` when the block does not open with a depth-0 choice,
    /// `SyntaxError` for an answer whose name does not end in `-0`.
    pub fn build(self) -> Result<Vec<(String, RouteNode)>> {
        let root = self.knot.root;
        let lines = self.lines;

        let top = children(&lines, 0, 0);
        if top.is_empty() || lines.first().is_none_or(|l| l.depth != 0) {
            return Err(ScriptError::out_of_range(
                Phase::Route,
                format!("route '{root}' must open with a choice at depth 0"),
            ));
        }

        let mut nodes = Vec::new();
        let mut endings = Vec::new();

        let mut root_node = RouteNode::new(vec![root.clone()]);
        root_node.flow = top.into_iter().map(|i| stitch_for(&lines, i, &mut endings)).collect();
        nodes.push((root.clone(), root_node));

        for (i, line) in lines.iter().enumerate().skip(1) {
            if line.dead_end || line.is_choice() {
                continue;
            }
            let name = line.name.strip_suffix("-0").ok_or_else(|| {
                ScriptError::syntax(
                    Phase::Route,
                    format!("route '{root}': answer '{}' must end with '-0'", line.name),
                )
            })?;

            let mut text = line.keys.clone();
            text.push(name.to_string());
            let mut node = RouteNode::new(text);

            let answers = children(&lines, i + 1, line.depth + 1);
            if answers.is_empty() {
                node.goto = dead_end_at(&lines, i + 1, line.depth - 1).and_then(|end| end.goto.clone());
            } else {
                node.flow = answers.into_iter().map(|c| stitch_for(&lines, c, &mut endings)).collect();
            }
            nodes.push((name.to_string(), node));
        }

        nodes.extend(endings);
        Ok(nodes)
    }
}

/// Non-dead-end lines at `depth` from `start` on, up to the first shallower line.
fn children(lines: &[RouteLine], start: usize, depth: usize) -> Vec<usize> {
    let mut found = Vec::new();
    for (i, line) in lines.iter().enumerate().skip(start) {
        if line.depth < depth {
            break;
        }
        if !line.dead_end && line.depth == depth {
            found.push(i);
        }
    }
    found
}

fn dead_end_at(lines: &[RouteLine], index: usize, depth: usize) -> Option<&RouteLine> {
    lines.get(index).filter(|line| line.dead_end && line.depth == depth)
}

/// The stitch leading to the choice at `index`.
///
/// A choice nobody answers becomes a node of its own (pushed on `endings`)
/// and takes payload, gain and goto from the dead end right after it. An
/// answered choice takes payload and gain from a dead end two lines down.
fn stitch_for(lines: &[RouteLine], index: usize, endings: &mut Vec<(String, RouteNode)>) -> Stitch {
    let choice = &lines[index];
    let mut stitch = Stitch::new(format!("{}S", choice.name), choice.name.clone());
    stitch.context = choice.context_or_payload.clone();
    stitch.cost = choice.cost_or_gain.clone();

    if children(lines, index + 1, choice.depth + 1).is_empty() {
        let end = dead_end_at(lines, index + 1, choice.depth);
        let mut text = end.map(|e| e.keys.clone()).unwrap_or_default();
        text.extend(choice.keys.iter().cloned());
        let mut node = RouteNode::new(text);
        if let Some(end) = end {
            stitch.payload = end.context_or_payload.clone();
            stitch.gain = end.cost_or_gain.clone();
            node.goto = end.goto.clone();
        }
        endings.push((choice.name.clone(), node));
    } else if let Some(end) = dead_end_at(lines, index + 2, choice.depth) {
        stitch.payload = end.context_or_payload.clone();
        stitch.gain = end.cost_or_gain.clone();
    }
    stitch
}

/// Strip a leading `(...)` or `{...}` tag group. Text that does not parse as
/// tags is left alone.
fn take_group(text: &str, open: char, close: char) -> (TagSet, &str) {
    if text.starts_with(open)
        && let Some(end) = text.find(close)
        && let Ok(set) = parse_tag_group(&text[..=end], Phase::Route)
    {
        return (set, text[end + 1..].trim_start());
    }
    (TagSet::new(), text)
}

/// `before[inside]after` into (`before + inside`, `before + after`).
fn split_choice(text: &str) -> Option<(String, String)> {
    let open = text.find('[')?;
    let close = text.find(']').filter(|close| *close > open)?;
    let before = &text[..open];
    Some((
        format!("{before}{}", &text[open + 1..close]).trim().to_string(),
        format!("{before}{}", &text[close + 1..]).trim().to_string(),
    ))
}
