//! Parsers for single script lines.
//!
//! Wraps the pest grammar with builders that turn line content into the
//! shared data types. Callers hand in the content of one logical line, with
//! its two-character delimiter already stripped.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser as PestParser;

use nolan_data::{Phase, Result, ScriptError, Tag, TagSet};

mod rule;
mod state;
mod text;

pub use rule::{RuleLine, RuleText, parse_rule_line};
pub use state::{StateLine, parse_state_line};
pub use text::{TextLine, parse_text_line};

#[derive(PestParser)]
#[grammar = "src/grammar.pest"]
struct LineParser;

/// Run `rule` over `source` and return its single top-level pair.
fn parse_entry(rule: Rule, source: &str, phase: Phase) -> Result<Pair<'_, Rule>> {
    let mut pairs =
        LineParser::parse(rule, source).map_err(|e| ScriptError::syntax(phase, format!("'{}': {e}", source.trim())))?;
    pairs
        .next()
        .ok_or_else(|| ScriptError::syntax(phase, format!("'{}': nothing to parse", source.trim())))
}

/// Build a tag set from a `paren_set`, `brace_set` or `tag_list` pair.
fn parse_tag_set(pair: Pair<'_, Rule>, phase: Phase) -> Result<TagSet> {
    let mut set = TagSet::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::tag => set.insert(Tag::parse(inner.as_str()).map_err(|e| e.in_phase(phase))?),
            Rule::tag_list | Rule::paren_set | Rule::brace_set => {
                for tag in parse_tag_set(inner, phase)?.iter() {
                    set.insert(tag.clone());
                }
            },
            _ => {},
        }
    }
    Ok(set)
}

/// Parse a standalone `(tags)` or `{tags}` group.
///
/// # Errors
/// Returns a `SyntaxError` when `source` is not exactly one tag group.
pub fn parse_tag_group(source: &str, phase: Phase) -> Result<TagSet> {
    let pair = parse_entry(Rule::tag_group, source, phase)?;
    let group = pair
        .into_inner()
        .find(|p| matches!(p.as_rule(), Rule::paren_set | Rule::brace_set))
        .ok_or_else(|| ScriptError::syntax(phase, format!("'{source}': expected a tag group")))?;
    parse_tag_set(group, phase)
}

/// Sentences of a `sentences` or `once_sentences` pair, trimmed.
fn collect_sentences(pair: Pair<'_, Rule>) -> Vec<String> {
    pair.into_inner()
        .filter(|p| matches!(p.as_rule(), Rule::sentence | Rule::once_sentence))
        .map(|p| p.as_str().trim().to_string())
        .collect()
}
