use nolan_data::{Location, Phase, Result, ScriptError, TagSet, WorldState};

use super::{Rule, parse_entry, parse_tag_set};

/// A parsed `==` line: the tape label and its declared locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLine {
    pub label: String,
    pub state: WorldState,
}

/// Parse `LABEL [LOC, tag;tag] [LOC, tag]`.
///
/// The label is everything before the first `[`.
///
/// # Errors
/// `NullOrEmpty` (phase Tape) for a missing label, `SyntaxError` (phase State)
/// for malformed locations.
pub fn parse_state_line(source: &str) -> Result<StateLine> {
    let (label, body) = source.split_at(source.find('[').unwrap_or(source.len()));
    let label = label.trim();
    if label.is_empty() {
        return Err(ScriptError::empty(Phase::Tape, format!("state '{}' has no label", source.trim())));
    }

    let pair = parse_entry(Rule::state_body, body, Phase::State)?;
    let mut locations = Vec::new();
    for location in pair.into_inner().filter(|p| p.as_rule() == Rule::location) {
        let mut inner = location.into_inner();
        let name = inner
            .next()
            .ok_or_else(|| ScriptError::syntax(Phase::State, format!("tape '{label}': location has no name")))?
            .as_str()
            .to_string();
        let tags = match inner.next() {
            Some(list) => parse_tag_set(list, Phase::State)?,
            None => TagSet::new(),
        };
        locations.push(Location::new(name, tags));
    }

    Ok(StateLine {
        label: label.to_string(),
        state: WorldState::from_locations(locations),
    })
}
