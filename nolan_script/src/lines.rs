//! Splitting script source into classified logical lines.
//!
//! A line is classified by its first two characters. Any other non-blank
//! line continues the previous one, which is how long text is written over
//! several physical lines.

use nolan_data::{Phase, Result, ScriptError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `==` or `=>`: opens a tape.
    State,
    /// `++`
    Rule,
    /// `--` or `->`
    Route,
    /// `##`
    Text,
    /// `//`
    Comment,
    /// `**`, kept inert.
    Goal,
    /// `??`, kept inert.
    Step,
}

impl LineKind {
    pub fn classify(line: &str) -> Option<LineKind> {
        let kind = match line.get(..2)? {
            "==" | "=>" => LineKind::State,
            "++" => LineKind::Rule,
            "--" | "->" => LineKind::Route,
            "##" => LineKind::Text,
            "//" => LineKind::Comment,
            "**" => LineKind::Goal,
            "??" => LineKind::Step,
            _ => return None,
        };
        Some(kind)
    }
}

/// One logical line with its continuations joined in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based number of the physical line that opened it.
    pub number: usize,
    pub kind: LineKind,
    /// Route lines keep their hyphens; every other kind drops its delimiter.
    pub content: String,
}

impl ScriptLine {
    fn new(number: usize, kind: LineKind, line: &str) -> Self {
        let content = match kind {
            LineKind::Route => line.trim(),
            _ => line[2..].trim(),
        };
        Self {
            number,
            kind,
            content: content.to_string(),
        }
    }

    fn merge(&mut self, continuation: &str) {
        if !self.content.is_empty() {
            self.content.push(' ');
        }
        self.content.push_str(continuation);
    }
}

/// Classify `source` line by line.
///
/// # Errors
/// `SyntaxError` (phase Tape) for text before the first classified line.
pub fn split_lines(source: &str) -> Result<Vec<ScriptLine>> {
    let mut lines: Vec<ScriptLine> = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let raw = raw.trim_end();
        if raw.trim().is_empty() {
            continue;
        }
        match LineKind::classify(raw) {
            Some(kind) => lines.push(ScriptLine::new(index + 1, kind, raw)),
            None => match lines.last_mut() {
                Some(last) => last.merge(raw.trim()),
                None => {
                    return Err(ScriptError::syntax(
                        Phase::Tape,
                        format!("'{}' does not belong to any declaration", raw.trim()),
                    )
                    .at_line(index + 1));
                },
            },
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_delimiter() {
        assert_eq!(LineKind::classify("== A [HOME, x]"), Some(LineKind::State));
        assert_eq!(LineKind::classify("=> END"), Some(LineKind::State));
        assert_eq!(LineKind::classify("++ ()-[x]->()"), Some(LineKind::Rule));
        assert_eq!(LineKind::classify("--> THANK"), Some(LineKind::Route));
        assert_eq!(LineKind::classify("-> THANK"), Some(LineKind::Route));
        assert_eq!(LineKind::classify("## HI Hello"), Some(LineKind::Text));
        assert_eq!(LineKind::classify("// note"), Some(LineKind::Comment));
        assert_eq!(LineKind::classify("** goal"), Some(LineKind::Goal));
        assert_eq!(LineKind::classify("?? step"), Some(LineKind::Step));
        assert_eq!(LineKind::classify("Hello"), None);
        assert_eq!(LineKind::classify("é"), None);
    }

    #[test]
    fn joins_continuations_and_skips_blanks() {
        let source = "== BOF [HOME, hero]\n\n++ ()-[?hero]->() #HI\nHello\n  there\n-- Oui[.] merci.\n";
        let lines = split_lines(source).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].content, "BOF [HOME, hero]");
        assert_eq!(lines[1].kind, LineKind::Rule);
        assert_eq!(lines[1].content, "()-[?hero]->() #HI Hello there");
        assert_eq!(lines[1].number, 3);
        assert_eq!(lines[2].content, "-- Oui[.] merci.");
    }

    #[test]
    fn text_before_any_declaration_is_an_error() {
        let err = split_lines("\nstray words\n== A [HOME, x]").unwrap_err();
        assert_eq!(err.phase, Phase::Tape);
        assert!(err.message.starts_with("line 2:"));
    }
}
