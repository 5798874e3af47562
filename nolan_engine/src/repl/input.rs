//! Reading player commands.
//!
//! The backend is chosen once per session from [`PlayConfig`]: a rustyline
//! editor with command completion when stdin is a terminal and
//! `line_editor` is on, buffered stdin otherwise.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use log::{info, warn};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use crate::command::COMMAND_WORDS;
use crate::config::PlayConfig;

/// One read from the player.
#[derive(Debug, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    Eof,
    Interrupted,
}

/// Completes command words; numbers need no help.
struct CommandWords;

impl Helper for CommandWords {}
impl Hinter for CommandWords {
    type Hint = String;
}
impl Highlighter for CommandWords {}
impl Validator for CommandWords {}

impl Completer for CommandWords {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = line[..pos].trim_start();
        Ok((pos - typed.len(), complete_word(typed)))
    }
}

fn complete_word(typed: &str) -> Vec<Pair> {
    if typed.is_empty() {
        return Vec::new();
    }
    let typed = typed.to_lowercase();
    COMMAND_WORDS
        .iter()
        .filter(|word| word.starts_with(&typed))
        .map(|word| Pair {
            display: (*word).to_string(),
            replacement: (*word).to_string(),
        })
        .collect()
}

/// Where commands come from for the whole session.
pub enum Input {
    Editor(LineEditor),
    Plain(PlainInput<io::StdinLock<'static>, io::Stdout>),
}

impl Input {
    pub fn open(config: &PlayConfig) -> Self {
        let plain = || Input::Plain(PlainInput::new(io::stdin().lock(), io::stdout()));
        if !config.line_editor || !io::stdin().is_terminal() {
            info!("reading commands from plain stdin");
            return plain();
        }
        match LineEditor::new(config.history_path()) {
            Ok(editor) => Input::Editor(editor),
            Err(err) => {
                warn!("line editor unavailable ({err}); reading plain stdin");
                plain()
            },
        }
    }

    /// # Errors
    /// The terminal or stdin cannot be read.
    pub fn read(&mut self, prompt: &str) -> io::Result<InputEvent> {
        match self {
            Input::Editor(editor) => editor.read(prompt),
            Input::Plain(plain) => plain.read(prompt),
        }
    }
}

/// Rustyline with completion and an optional history file.
pub struct LineEditor {
    editor: Editor<CommandWords, DefaultHistory>,
    history: Option<PathBuf>,
}

impl LineEditor {
    fn new(history: Option<PathBuf>) -> rustyline::Result<Self> {
        let mut editor: Editor<CommandWords, DefaultHistory> = Editor::new()?;
        editor.set_helper(Some(CommandWords));
        if let Some(path) = &history {
            match editor.load_history(path) {
                Ok(()) => info!("history loaded from '{}'", path.display()),
                Err(ReadlineError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {},
                Err(err) => warn!("cannot read history '{}': {err}", path.display()),
            }
        }
        Ok(Self { editor, history })
    }

    fn read(&mut self, prompt: &str) -> io::Result<InputEvent> {
        let line = match self.editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => return Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => return Ok(InputEvent::Eof),
            Err(ReadlineError::Io(err)) => return Err(err),
            Err(err) => return Err(io::Error::other(err)),
        };
        if !line.trim().is_empty() {
            self.remember(&line);
        }
        Ok(InputEvent::Line(line))
    }

    fn remember(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            warn!("history entry dropped: {err}");
        }
        let Some(path) = &self.history else {
            return;
        };
        if let Some(dir) = path.parent()
            && let Err(err) = std::fs::create_dir_all(dir)
        {
            warn!("cannot create '{}': {err}", dir.display());
            return;
        }
        if let Err(err) = self.editor.save_history(path) {
            warn!("cannot save history '{}': {err}", path.display());
        }
    }
}

/// Line-at-a-time reader for pipes, scripts and dumb terminals.
pub struct PlainInput<R, W> {
    reader: R,
    prompt_out: W,
    buffer: String,
}

impl<R: BufRead, W: Write> PlainInput<R, W> {
    pub fn new(reader: R, prompt_out: W) -> Self {
        Self {
            reader,
            prompt_out,
            buffer: String::new(),
        }
    }

    /// # Errors
    /// Writing the prompt or reading the line fails.
    pub fn read(&mut self, prompt: &str) -> io::Result<InputEvent> {
        write!(self.prompt_out, "{prompt}")?;
        self.prompt_out.flush()?;

        self.buffer.clear();
        if self.reader.read_line(&mut self.buffer)? == 0 {
            return Ok(InputEvent::Eof);
        }
        Ok(InputEvent::Line(self.buffer.trim_end_matches(['\n', '\r']).to_string()))
    }
}
