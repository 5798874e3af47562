//! Error taxonomy shared by the compiler and the engine.

use std::fmt;

/// What went wrong, independent of where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required text or collection is missing.
    NullOrEmpty,
    /// Index or depth outside valid bounds.
    OutOfRange,
    /// Lookup miss on a location, text or tape name.
    KeyNotFound,
    /// Name collision for a route, tape or text sequence.
    DuplicateKey,
    /// Grammar or indentation violation.
    SyntaxError,
    /// A source or artifact file could not be found.
    FileNotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NullOrEmpty => "empty value",
            ErrorKind::OutOfRange => "out of range",
            ErrorKind::KeyNotFound => "key not found",
            ErrorKind::DuplicateKey => "duplicate key",
            ErrorKind::SyntaxError => "syntax error",
            ErrorKind::FileNotFound => "file not found",
        };
        f.write_str(label)
    }
}

/// Where the error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Parsing a standalone tag token.
    Tag,
    State,
    Rule,
    Route,
    Text,
    Tape,
    /// Applying operations or looking things up while playing.
    Play,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Tag => "tag",
            Phase::State => "state",
            Phase::Rule => "rule",
            Phase::Route => "route",
            Phase::Text => "text",
            Phase::Tape => "tape",
            Phase::Play => "play",
        };
        f.write_str(label)
    }
}

/// A script error: a kind, the phase it happened in, and a message for the author.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{phase} {kind}: {message}")]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub phase: Phase,
    pub message: String,
}

impl ScriptError {
    pub fn new(kind: ErrorKind, phase: Phase, message: impl Into<String>) -> Self {
        Self {
            kind,
            phase,
            message: message.into(),
        }
    }

    pub fn syntax(phase: Phase, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, phase, message)
    }

    pub fn empty(phase: Phase, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NullOrEmpty, phase, message)
    }

    pub fn not_found(phase: Phase, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyNotFound, phase, message)
    }

    pub fn duplicate(phase: Phase, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateKey, phase, message)
    }

    pub fn out_of_range(phase: Phase, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutOfRange, phase, message)
    }

    /// Re-attribute the error to the phase that was running when it surfaced.
    #[must_use]
    pub fn in_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    /// Prefix the message with the 1-based source line it came from.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.message = format!("line {line}: {}", self.message);
        self
    }
}

pub type Result<T, E = ScriptError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_phase_and_kind() {
        let err = ScriptError::duplicate(Phase::Tape, "tape 'INTRO' already exists").at_line(4);
        assert_eq!(err.to_string(), "tape duplicate key: line 4: tape 'INTRO' already exists");
    }

    #[test]
    fn in_phase_keeps_kind_and_message() {
        let err = ScriptError::syntax(Phase::Tag, "bad step").in_phase(Phase::Rule);
        assert_eq!(err.kind, ErrorKind::SyntaxError);
        assert_eq!(err.phase, Phase::Rule);
        assert_eq!(err.message, "bad step");
    }
}
