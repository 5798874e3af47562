#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! nolan_engine: plays compiled Nolan tapes.
//!
//! Each turn the rulebook is expanded against the world state and every rule
//! that applies in the current scene becomes an [`Action`]. Performing an
//! action applies its operations and shows its text, which may open a
//! dialogue route whose choices are [`Stitch`](nolan_data::Stitch)es.

pub const NOLAN_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod command;
pub mod config;
pub mod loader;
pub mod repl;
pub mod rules;
pub mod sequence;
pub mod session;
pub mod stitch;
pub mod style;

pub use config::PlayConfig;
pub use loader::{load_tapes, select_tape};
pub use repl::run_repl;
pub use rules::{Accepted, Action, Actions, accept, compute, expand_rulebook, resolve_syntax};
pub use sequence::{Reading, read_key, read_name};
pub use session::{Frame, Playthrough};
pub use stitch::{FlowStep, accept_flow, accept_stitch};
