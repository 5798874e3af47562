//! The player's read-eval-print loop.
//!
//! Each turn lists what can be done: the numbered choices of the current
//! dialogue node when it offers any, otherwise the numbered actions of the
//! scene. A number plays the entry; `undo`, `state`, `help` and `quit` do
//! what they say.

mod input;

use anyhow::Result;
use log::info;
use nolan_data::text::is_signal;
use nolan_data::{Operation, ScriptError};

use crate::command::{Command, parse_command};
use crate::config::PlayConfig;
use crate::rules::Actions;
use crate::session::Playthrough;
use crate::stitch::FlowStep;
use crate::style::PlayStyle;

use input::{Input, InputEvent};

/// Control flow signal used by handlers to exit the REPL.
pub enum ReplControl {
    Continue,
    Quit,
}

/// Recoverable problems reported to the player without leaving the loop.
#[derive(Debug, thiserror::Error)]
pub enum ReplError {
    #[error("nothing is numbered {0}")]
    NoSuchEntry(usize),
    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// What the player can pick from this turn.
pub enum Menu {
    Choices(Vec<(usize, FlowStep)>),
    Actions(Actions),
}

impl Menu {
    /// Choices of the current dialogue node, or the scene's actions when there are none.
    ///
    /// # Errors
    /// See [`Playthrough::actions`].
    pub fn current(play: &Playthrough) -> std::result::Result<Self, ScriptError> {
        let flow = play.flow();
        if flow.is_empty() { Ok(Menu::Actions(play.actions()?)) } else { Ok(Menu::Choices(flow)) }
    }

    /// Numbered labels: choice short text or action description.
    pub fn labels(&self, play: &Playthrough) -> Vec<String> {
        match self {
            Menu::Choices(steps) => {
                let Some((_, node)) = play.node() else {
                    return Vec::new();
                };
                steps
                    .iter()
                    .map(|(index, step)| {
                        let choice = &node.flow[*index].choice;
                        play.text(choice).unwrap_or_else(|_| step.next.clone())
                    })
                    .collect()
            },
            Menu::Actions(actions) => actions.iter().map(|a| a.description.trim_end().to_string()).collect(),
        }
    }

    /// Play entry `number` (1-based) and return the shown keys and the operations applied.
    ///
    /// # Errors
    /// `NoSuchEntry` for a number outside the menu, or the session's error.
    pub fn pick(&self, play: &mut Playthrough, number: usize) -> std::result::Result<(Vec<String>, Vec<Operation>), ReplError> {
        let index = number.checked_sub(1).ok_or(ReplError::NoSuchEntry(number))?;
        match self {
            Menu::Choices(steps) => {
                let (_, step) = steps.get(index).ok_or(ReplError::NoSuchEntry(number))?;
                Ok((play.follow(step)?, step.operations.clone()))
            },
            Menu::Actions(actions) => {
                let action = actions.iter().nth(index).ok_or(ReplError::NoSuchEntry(number))?;
                Ok((play.perform(action)?, action.operations.clone()))
            },
        }
    }
}

/// Run the loop until the player quits or input ends.
///
/// # Errors
/// Reading from the terminal fails for good.
pub fn run_repl(play: &mut Playthrough, config: &PlayConfig) -> Result<()> {
    let mut input = Input::open(config);
    print_scene(play);

    loop {
        let menu = match Menu::current(play) {
            Ok(menu) => menu,
            Err(err) => {
                println!("{}", err.to_string().error_style());
                Menu::Actions(Actions::new())
            },
        };
        print_menu(&menu, play);

        let prompt = format!("\n[{}|turn {}]> ", play.scene(), play.turn());
        let line = match input.read(&prompt)? {
            InputEvent::Line(line) => line,
            InputEvent::Eof => "quit".to_string(),
            InputEvent::Interrupted => {
                println!("{}", "Command canceled.".operation_style());
                continue;
            },
        };

        if let ReplControl::Quit = dispatch(parse_command(&line), &menu, play, config) {
            info!("player quit after {} turns", play.turn());
            break;
        }
    }
    Ok(())
}

fn dispatch(command: Command, menu: &Menu, play: &mut Playthrough, config: &PlayConfig) -> ReplControl {
    match command {
        Command::Choose(number) => {
            let scene = play.scene().to_string();
            match menu.pick(play, number) {
                Ok((keys, operations)) => {
                    if config.show_operations {
                        for op in &operations {
                            println!("  {}", op.to_string().operation_style());
                        }
                    }
                    print_lines(play, &keys, config.wrap_width);
                    if !play.scene().eq_ignore_ascii_case(&scene) {
                        print_scene(play);
                    }
                },
                Err(err) => println!("{}", err.to_string().error_style()),
            }
        },
        Command::Undo => {
            if play.undo() {
                println!("{}", "Back one turn.".operation_style());
                print_scene(play);
            } else {
                println!("{}", "Nothing to undo.".error_style());
            }
        },
        Command::State => {
            for location in play.state().locations() {
                println!("{} {}", location.name.section_style(), location.tags.to_string().operation_style());
            }
        },
        Command::Help => print_help(),
        Command::Quit => return ReplControl::Quit,
        Command::Unknown(text) if text.is_empty() => {},
        Command::Unknown(text) => println!("{}", format!("Unknown command '{text}'. Type 'help'.").error_style()),
    }
    ReplControl::Continue
}

fn print_scene(play: &Playthrough) {
    println!("\n{}", play.scene().scene_style());
}

fn print_menu(menu: &Menu, play: &Playthrough) {
    let labels = menu.labels(play);
    if labels.is_empty() {
        println!("{}", "Nothing to do here. Try 'undo' or 'quit'.".operation_style());
        return;
    }
    for (number, label) in labels.iter().enumerate() {
        let label = match menu {
            Menu::Choices(_) => label.choice_style(),
            Menu::Actions(_) => label.action_style(),
        };
        println!("{} {label}", format!("{}.", number + 1).index_style());
    }
}

fn print_lines(play: &Playthrough, keys: &[String], width: usize) {
    for key in keys {
        if is_signal(key) {
            println!("{}", key.signal_style());
            continue;
        }
        match play.line(key) {
            Ok(line) => println!("{}", textwrap::fill(line, width.max(20)).story_style()),
            Err(err) => println!("{}", err.to_string().error_style()),
        }
    }
}

fn print_help() {
    println!("{}", "Commands".section_style());
    for (command, meaning) in [
        ("<number>", "play the numbered action or answer"),
        ("undo", "take the last turn back"),
        ("state", "show every location and its tags"),
        ("help", "show this list"),
        ("quit", "leave the story"),
    ] {
        println!("  {} {meaning}", format!("{command:<9}").index_style());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nolan_script::compile_script;

    fn play() -> Playthrough {
        let script = include_str!("../tests/fixtures/kingquest.nolan");
        let tape = compile_script(script).unwrap().tapes.remove(0);
        Playthrough::new(tape, Some("HOME")).unwrap()
    }

    #[test]
    fn menu_switches_to_choices_inside_a_route() {
        let mut play = play();
        let menu = Menu::current(&play).unwrap();
        let labels = menu.labels(&play);
        let talk = labels.iter().position(|l| l == "Poke the king.").unwrap();

        menu.pick(&mut play, talk + 1).unwrap();
        let menu = Menu::current(&play).unwrap();
        assert!(matches!(menu, Menu::Choices(_)));
        assert_eq!(menu.labels(&play), ["Oui.", "Peut-être?", "Non!"]);
    }

    #[test]
    fn out_of_range_numbers_are_reported() {
        let mut play = play();
        let menu = Menu::current(&play).unwrap();
        assert!(matches!(menu.pick(&mut play, 0), Err(ReplError::NoSuchEntry(0))));
        assert!(matches!(menu.pick(&mut play, 99), Err(ReplError::NoSuchEntry(99))));
        assert_eq!(play.turn(), 0);
    }
}
