#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Nolan **
//! Interactive player for Nolan tapes and scripts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::info;

use nolan_engine::config::CONFIG_FILE;
use nolan_engine::{NOLAN_VERSION, PlayConfig, Playthrough, load_tapes, run_repl, select_tape};

#[derive(Parser)]
#[command(author, version, about = "Play a Nolan tape or script in the terminal.")]
struct Cli {
    /// Script source, or a compiled `.json` / `.ron` tape.
    file: PathBuf,
    /// Tape to play when the file holds several.
    #[arg(long, value_name = "LABEL")]
    tape: Option<String>,
    /// Starting scene; defaults to the first location of the tape.
    #[arg(long, value_name = "NAME")]
    scene: Option<String>,
    /// Settings file.
    #[arg(long, value_name = "PATH", default_value = CONFIG_FILE)]
    config: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = PlayConfig::load(&cli.config)?;
    let tapes = load_tapes(&cli.file)?;
    let tape = select_tape(tapes, cli.tape.as_deref())?;
    let label = tape.label.clone();
    let mut play = Playthrough::new(tape, cli.scene.as_deref()).with_context(|| format!("starting tape '{label}'"))?;
    info!("nolan {NOLAN_VERSION}: playing '{label}'");

    println!("{}", label.bright_yellow().underline());
    run_repl(&mut play, &config)
}
