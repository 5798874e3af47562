//! Player commands typed at the prompt.

/// Commands understood by the player REPL.
#[derive(Debug, PartialEq, Eq, variantly::Variantly)]
pub enum Command {
    /// Play the numbered action or dialogue choice (1-based).
    Choose(usize),
    Help,
    Quit,
    State,
    Undo,
    Unknown(String),
}

/// Words offered by tab completion.
pub const COMMAND_WORDS: &[&str] = &["back", "exit", "help", "quit", "state", "undo"];

/// Parse one input line. Blank input is `Unknown("")`.
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    if let Ok(number) = input.parse::<usize>() {
        return Command::Choose(number);
    }
    match input.to_lowercase().as_str() {
        "undo" | "u" | "back" => Command::Undo,
        "state" | "s" | "world" => Command::State,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(input.to_string()),
    }
}
