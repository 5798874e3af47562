use nolan_data::{Phase, Result, ScriptError};

use super::{Rule, collect_sentences, parse_entry};

/// A parsed `##` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub name: String,
    pub sentences: Vec<String>,
    /// Sentences were separated by `&`: show each once, then stay on the last.
    pub once: bool,
}

/// Parse `NAME a|b|c` or `NAME a&b&c`.
///
/// # Errors
/// `SyntaxError` (phase Text) when the name or the text is missing.
pub fn parse_text_line(source: &str) -> Result<TextLine> {
    let pair = parse_entry(Rule::text_line, source, Phase::Text)?;
    let mut name = None;
    let mut sentences = Vec::new();
    let mut once = false;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::text_key => name = Some(part.as_str().to_string()),
            Rule::once_sentences => {
                once = true;
                sentences = collect_sentences(part);
            },
            Rule::sentences => sentences = collect_sentences(part),
            _ => {},
        }
    }

    let name = name.ok_or_else(|| ScriptError::syntax(Phase::Text, format!("'{}': text has no name", source.trim())))?;
    Ok(TextLine { name, sentences, once })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sentence() {
        let line = parse_text_line("GREET Bonjour, étranger.").unwrap();
        assert_eq!(line.name, "GREET");
        assert_eq!(line.sentences, ["Bonjour, étranger."]);
        assert!(!line.once);
    }

    #[test]
    fn pipes_make_a_loop() {
        let line = parse_text_line("IDLE Hm. | Well? |Go on.").unwrap();
        assert_eq!(line.sentences, ["Hm.", "Well?", "Go on."]);
        assert!(!line.once);
    }

    #[test]
    fn ampersands_make_a_once_sequence() {
        let line = parse_text_line("INTRO First time. & Second time.").unwrap();
        assert_eq!(line.sentences, ["First time.", "Second time."]);
        assert!(line.once);
    }

    #[test]
    fn ampersand_next_to_pipes_stays_in_the_sentence() {
        let line = parse_text_line("DUO Tom & Jerry|Laurel & Hardy").unwrap();
        assert_eq!(line.sentences, ["Tom & Jerry", "Laurel & Hardy"]);
        assert!(!line.once);
    }

    #[test]
    fn name_without_text_is_rejected() {
        assert!(parse_text_line("EMPTY").is_err());
    }
}
