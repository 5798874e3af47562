use pest::iterators::Pair;

use nolan_data::{Phase, Result, Rule as NolanRule, ScriptError, Tag, TagSet};

use super::{Rule, collect_sentences, parse_entry, parse_tag_set};

/// A parsed `++` line: the rule and the text written after `#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLine {
    pub rule: NolanRule,
    pub text: Option<RuleText>,
}

/// `#NAME sentence|sentence`; `sentences` is empty when only the key is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleText {
    pub name: String,
    pub sentences: Vec<String>,
}

/// Parse the content of a rule line, `(context)cost[match]->(payload){gain} #TEXT ...`.
///
/// # Errors
/// `SyntaxError` (phase Rule) for content the grammar rejects, for a bad tag,
/// and for a gain tag that also appears, by identifier, in the cost.
pub fn parse_rule_line(source: &str) -> Result<RuleLine> {
    let pair = parse_entry(Rule::rule_line, source, Phase::Rule)?;

    let mut match_tag = None;
    let mut context = TagSet::new();
    let mut cost = TagSet::new();
    let mut drag = true;
    let mut payload = TagSet::new();
    let mut gain = TagSet::new();
    let mut text = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::context => context = parse_tag_set(part, Phase::Rule)?,
            Rule::cost => (cost, drag) = parse_cost(part)?,
            Rule::match_tag => {
                let tag = part
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::tag)
                    .ok_or_else(|| ScriptError::syntax(Phase::Rule, "rule has no match tag"))?;
                match_tag = Some(Tag::parse(tag.as_str()).map_err(|e| e.in_phase(Phase::Rule))?);
            },
            Rule::payload => payload = parse_tag_set(part, Phase::Rule)?,
            Rule::gain => gain = parse_tag_set(part, Phase::Rule)?,
            Rule::rule_text => text = Some(parse_rule_text(part)?),
            _ => {},
        }
    }

    let match_tag = match_tag.ok_or_else(|| ScriptError::syntax(Phase::Rule, "rule has no match tag"))?;
    if let Some(conflict) = gain
        .iter()
        .filter(|g| !g.contains_sugar())
        .find(|g| cost.iter().any(|c| !c.contains_sugar() && c.value() == g.value()))
    {
        return Err(ScriptError::syntax(
            Phase::Rule,
            format!("gain '{conflict}' is also paid as cost in [{match_tag}]"),
        ));
    }

    let mut rule = NolanRule::new(match_tag);
    rule.context = context;
    rule.cost = cost;
    rule.drag = drag;
    rule.payload = payload;
    rule.gain = gain;
    rule.text = text.as_ref().map(|t: &RuleText| t.name.clone());
    Ok(RuleLine { rule, text })
}

/// `(cost, drag)` of a `cost` pair; a bare `-` is an empty drag cost.
fn parse_cost(pair: Pair<'_, Rule>) -> Result<(TagSet, bool)> {
    let Some(kind) = pair.into_inner().next() else {
        return Ok((TagSet::new(), true));
    };
    let drag = kind.as_rule() != Rule::drop_cost;
    let set = match kind.into_inner().next() {
        Some(group) => parse_tag_set(group, Phase::Rule)?,
        None => TagSet::new(),
    };
    Ok((set, drag))
}

fn parse_rule_text(pair: Pair<'_, Rule>) -> Result<RuleText> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .ok_or_else(|| ScriptError::syntax(Phase::Rule, "rule text has no key"))?
        .as_str()
        .to_string();
    let sentences = inner.next().map(collect_sentences).unwrap_or_default();
    Ok(RuleText { name, sentences })
}
