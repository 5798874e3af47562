//! Tag tokens, the atomic facts a world state is made of.
//!
//! A tag is written `[!?]identifier[meter][<LOCATION>]`:
//! - the prefix picks the [`TagOp`]: `?` must be present, `!` must be absent,
//!   no prefix means the tag is consumed or produced,
//! - the meter is an optional numeric suffix (`gold.5`, `gold.1..5`, `gold..`,
//!   `gold.++`, `gold.--2`, `gold.<=5`, `gold.>=5`),
//! - the location names the bucket of the world state the tag refers to.
//!
//! Tags carrying wildcards, meter mutations or comparisons are *sugar*:
//! templates that [`Tag::resolve_syntax`] expands into concrete tags picked
//! from a pool.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Phase, Result, ScriptError};
use crate::tag_set::TagSet;

pub const METER_MIN: i16 = i16::MIN;
pub const METER_MAX: i16 = i16::MAX;

/// What a tag asks of the world state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagOp {
    /// No prefix: the tag is removed when consumed, appended when produced.
    #[default]
    RemoveOrAppend,
    /// `?` prefix: the tag must be present and is left in place.
    SucceedIfPresent,
    /// `!` prefix: the tag must be absent.
    FailedIfPresent,
}

impl TagOp {
    pub fn prefix(self) -> &'static str {
        match self {
            TagOp::RemoveOrAppend => "",
            TagOp::SucceedIfPresent => "?",
            TagOp::FailedIfPresent => "!",
        }
    }
}

/// Numeric suffix of a tag.
///
/// Unused fields hold the `i16` sentinels, see [`Meter::UNSET`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Meter {
    pub start: i16,
    pub end: i16,
    pub value: i16,
    pub step: i16,
}

impl Meter {
    /// No numeric suffix at all; also the shape of an open range (`gold..`).
    pub const UNSET: Meter = Meter {
        start: METER_MIN,
        end: METER_MAX,
        value: METER_MIN,
        step: 0,
    };

    fn valued(value: i16) -> Self {
        Meter { value, ..Self::UNSET }
    }

    fn stepped(step: i16) -> Self {
        Meter {
            value: METER_MAX,
            step,
            ..Self::UNSET
        }
    }

    /// True when `value` is a number rather than a sentinel.
    pub fn has_value(&self) -> bool {
        self.value > METER_MIN && self.value < METER_MAX
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::UNSET
    }
}

/// One parsed tag token. Equality, ordering and hashing use the raw text only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag {
    raw: String,
    value: String,
    op: TagOp,
    location: Option<String>,
    meter: Meter,
}

impl Tag {
    /// Parse one tag token.
    ///
    /// ```
    /// use nolan_data::{Tag, TagOp};
    ///
    /// let tag = Tag::parse("?gold>=5<HOME>").unwrap();
    /// assert_eq!(tag.op(), TagOp::SucceedIfPresent);
    /// assert_eq!(tag.value(), "gold");
    /// assert_eq!(tag.location(), Some("HOME"));
    /// assert_eq!(tag.meter().start, 5);
    /// assert_eq!(tag.raw(), "?gold>=5<HOME>");
    /// ```
    ///
    /// # Errors
    /// `NullOrEmpty` for an empty token or identifier, `SyntaxError` when the
    /// number after `++`, `--`, `<=` or `>=` is not a 16-bit integer.
    pub fn parse(text: &str) -> Result<Self> {
        let raw = text.trim();
        if raw.is_empty() {
            return Err(ScriptError::empty(Phase::Tag, "tag text is empty"));
        }

        let (body, location) = split_location(raw);
        let (op, body) = match body.as_bytes().first() {
            Some(b'?') => (TagOp::SucceedIfPresent, &body[1..]),
            Some(b'!') => (TagOp::FailedIfPresent, &body[1..]),
            _ => (TagOp::RemoveOrAppend, body),
        };
        let (value, meter) =
            parse_meter(body).map_err(|message| ScriptError::syntax(Phase::Tag, format!("tag '{raw}': {message}")))?;
        if value.is_empty() {
            return Err(ScriptError::empty(Phase::Tag, format!("tag '{raw}' has no identifier")));
        }

        Ok(Tag {
            raw: raw.to_string(),
            value: value.to_string(),
            op,
            location,
            meter,
        })
    }

    /// The token exactly as written.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The identifier without prefix, meter markers or location.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn op(&self) -> TagOp {
        self.op
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn meter(&self) -> Meter {
        self.meter
    }

    pub fn has_meter(&self) -> bool {
        self.meter.has_value()
    }

    pub fn is_joker(&self) -> bool {
        self.raw.contains('*')
    }

    pub fn is_range(&self) -> bool {
        self.raw.contains("..") && self.meter.start > METER_MIN && self.meter.end < METER_MAX
    }

    pub fn is_open_range(&self) -> bool {
        self.raw.contains("..") && self.meter == Meter::UNSET
    }

    pub fn is_greater(&self) -> bool {
        self.raw.contains(">=") && self.meter.step == METER_MAX
    }

    pub fn is_lower(&self) -> bool {
        self.raw.contains("<=") && self.meter.step == METER_MIN
    }

    pub fn is_increment(&self) -> bool {
        self.raw.contains("++") && self.meter.step > 0
    }

    pub fn is_decrement(&self) -> bool {
        self.raw.contains("--") && self.meter.step < 0
    }

    /// A `>=`, `<=` or bounded range test, checked against meters at acceptance time.
    pub fn is_comparison(&self) -> bool {
        self.is_greater() || self.is_lower() || self.is_range()
    }

    /// True when the tag must be expanded by [`Tag::resolve_syntax`] before use.
    ///
    /// Comparisons and ranges only count for plain tags: `?gold>=5` is a test,
    /// `gold>=5` is a template.
    pub fn contains_sugar(&self) -> bool {
        self.is_joker()
            || self.is_increment()
            || self.is_decrement()
            || (self.op == TagOp::RemoveOrAppend
                && (self.is_greater() || self.is_lower() || self.raw.contains("..")))
    }

    /// This tag's identifier moved to `location` with operation `op`.
    ///
    /// # Errors
    /// Propagates the parse error of the rebuilt token.
    pub fn relocated(&self, location: Option<&str>, op: TagOp) -> Result<Tag> {
        Tag::parse(&compose(op, &self.value, location))
    }

    /// This tag with its meter value shifted by `step`, moved to `location` with operation `op`.
    ///
    /// # Errors
    /// Propagates the parse error of the rebuilt token.
    pub fn incremented(&self, step: i16, location: Option<&str>, op: TagOp) -> Result<Tag> {
        let old = self.meter.value.to_string();
        let new = self.meter.value.saturating_add(step).to_string();
        let value = match self.value.rfind(&old) {
            Some(at) => format!("{}{new}{}", &self.value[..at], &self.value[at + old.len()..]),
            None => self.value.clone(),
        };
        Tag::parse(&compose(op, &value, location))
    }

    /// Expand a sugar tag into the concrete tags it stands for within `pool`.
    ///
    /// A tag without sugar resolves to itself. A template that matches nothing
    /// resolves to an empty list.
    ///
    /// # Errors
    /// Propagates the parse error of a rebuilt token.
    pub fn resolve_syntax(&self, pool: &TagSet) -> Result<Vec<Tag>> {
        if !self.contains_sugar() {
            return Ok(vec![self.clone()]);
        }
        if let Some((prefix, suffix)) = wildcard_parts(&self.value) {
            return self.resolve_wildcard(prefix, suffix, pool);
        }

        let location = self.location();
        if self.is_increment() || self.is_decrement() {
            return pool
                .iter()
                .filter(|tag| starts_with_ignore_case(tag.value(), &self.value) && tag.has_meter())
                .map(|tag| tag.incremented(self.meter.step, location, self.op))
                .collect();
        }

        let greater = self.is_greater();
        if greater || self.is_lower() {
            return Ok(self.matching(pool, |value| {
                if greater { value >= self.meter.start } else { value <= self.meter.end }
            }));
        }
        if self.is_range() {
            return Ok(self.matching(pool, |value| self.meter.start <= value && value <= self.meter.end));
        }
        if self.meter == Meter::UNSET {
            return Ok(self.matching(pool, |_| true));
        }

        Ok(vec![self.clone()])
    }

    /// Pool tags sharing this identifier as a prefix whose meter value passes `in_range`.
    fn matching(&self, pool: &TagSet, in_range: impl Fn(i16) -> bool) -> Vec<Tag> {
        pool.iter()
            .filter(|tag| {
                tag.has_meter() && in_range(tag.meter.value) && starts_with_ignore_case(tag.value(), &self.value)
            })
            .cloned()
            .collect()
    }

    fn resolve_wildcard(&self, prefix: Option<&str>, suffix: Option<&str>, pool: &TagSet) -> Result<Vec<Tag>> {
        let matches = pool
            .iter()
            .filter(|tag| {
                prefix.is_none_or(|p| starts_with_ignore_case(tag.value(), p))
                    && suffix.is_none_or(|s| ends_with_ignore_case(tag.value(), s))
            })
            .map(|tag| tag.relocated(self.location(), self.op))
            .collect::<Result<Vec<_>>>()?;
        if !matches.is_empty() {
            return Ok(matches);
        }

        // Second pass: retry with the outermost segment of the template dropped.
        let (Some(first_dot), Some(last_dot)) = (self.value.find('.'), self.value.rfind('.')) else {
            return Ok(Vec::new());
        };
        if first_dot >= last_dot {
            return Ok(Vec::new());
        }

        let mut resolved = Vec::new();
        match (prefix, suffix) {
            (Some(prefix), None) => {
                let tail = &prefix[first_dot + 1..];
                for tag in pool.iter() {
                    if tag.value().len() > tail.len() && starts_with_ignore_case(tag.value(), tail) {
                        resolved.push(Tag::parse(&self.raw.replace('*', &tag.value()[tail.len()..]))?);
                    }
                }
            },
            (None, Some(suffix)) => {
                let Some(at) = suffix.rfind('.') else {
                    return Ok(resolved);
                };
                let head = &suffix[..at];
                for tag in pool.iter() {
                    let value = tag.value();
                    if value.len() > head.len() && ends_with_ignore_case(value, head) {
                        resolved.push(Tag::parse(&self.raw.replace('*', &value[..value.len() - head.len()]))?);
                    }
                }
            },
            _ => {},
        }
        Ok(resolved)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl FromStr for Tag {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self> {
        Tag::parse(s)
    }
}

impl TryFrom<String> for Tag {
    type Error = ScriptError;

    fn try_from(value: String) -> Result<Self> {
        Tag::parse(&value)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.raw
    }
}

fn compose(op: TagOp, value: &str, location: Option<&str>) -> String {
    match location {
        Some(location) => format!("{}{value}<{location}>", op.prefix()),
        None => format!("{}{value}", op.prefix()),
    }
}

/// Split `body<LOCATION>` on the last `<`/`>` pair.
fn split_location(raw: &str) -> (&str, Option<String>) {
    match (raw.rfind('<'), raw.rfind('>')) {
        (Some(open), Some(close)) if close > open => {
            let location = raw[open + 1..close].trim();
            (&raw[..open], (!location.is_empty()).then(|| location.to_string()))
        },
        _ => (raw, None),
    }
}

/// Split the meter off an identifier. Plain numbers stay in the identifier.
fn parse_meter(body: &str) -> std::result::Result<(&str, Meter), String> {
    if let Some(at) = body.rfind("..") {
        if at + 2 == body.len() {
            return Ok((&body[..at], Meter::UNSET));
        }
        let start = numeral_start(body, at);
        let (low, high) = body[start..at]
            .parse::<i16>()
            .ok()
            .zip(body[at + 2..].parse::<i16>().ok())
            .unwrap_or((METER_MAX, METER_MAX));
        let meter = Meter {
            start: low,
            end: high,
            value: METER_MIN,
            step: 0,
        };
        return Ok((&body[..start], meter));
    }

    if let Some(at) = body.rfind("++") {
        return Ok((&body[..at], Meter::stepped(number_after(body, at)?)));
    }
    if let Some(at) = body.rfind("--") {
        let step = number_after(body, at)?
            .checked_neg()
            .ok_or_else(|| "decrement out of range".to_string())?;
        return Ok((&body[..at], Meter::stepped(step)));
    }
    if let Some(at) = body.rfind("<=") {
        let end = number_after(body, at)?;
        return Ok((&body[..at], Meter { end, ..Meter::stepped(METER_MIN) }));
    }
    if let Some(at) = body.rfind(">=") {
        let start = number_after(body, at)?;
        return Ok((&body[..at], Meter { start, ..Meter::stepped(METER_MAX) }));
    }

    let start = numeral_start(body, body.len());
    let value = if start == 0 || start == body.len() {
        METER_MIN
    } else {
        body[start..].parse().unwrap_or(METER_MIN)
    };
    Ok((body, Meter::valued(value)))
}

/// The number following the two-character marker at `at`; a bare marker means 1.
fn number_after(body: &str, at: usize) -> std::result::Result<i16, String> {
    let rest = &body[at + 2..];
    if rest.is_empty() {
        return Ok(1);
    }
    rest.parse::<i16>()
        .map_err(|_| format!("'{rest}' after '{}' is not a number", &body[at..at + 2]))
}

/// Byte offset where the integer literal ending at `end` begins, sign included.
fn numeral_start(text: &str, end: usize) -> usize {
    let bytes = text.as_bytes();
    let mut start = end;
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    if start < end && start > 0 && bytes[start - 1] == b'-' {
        start -= 1;
    }
    start
}

/// `(prefix, suffix)` around the `*` of `a.*`, `*.b` or `a.*.b`.
fn wildcard_parts(value: &str) -> Option<(Option<&str>, Option<&str>)> {
    let inner = value.contains(".*.");
    let has_prefix = inner || value.ends_with(".*");
    let has_suffix = inner || value.starts_with("*.");
    if !has_prefix && !has_suffix {
        return None;
    }
    let star = value.find('*')?;
    Some((
        has_prefix.then(|| &value[..star]),
        has_suffix.then(|| &value[star + 1..]),
    ))
}

pub(crate) fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len() && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

pub(crate) fn ends_with_ignore_case(text: &str, suffix: &str) -> bool {
    text.len() >= suffix.len() && text.as_bytes()[text.len() - suffix.len()..].eq_ignore_ascii_case(suffix.as_bytes())
}
