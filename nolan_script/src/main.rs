//! CLI entry point for nolan_script.
//! Usage: nolan_script compile story.nolan --out-dir build [--format ron]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use nolan_data::{Tape, validate_tape};
use nolan_script::{CompiledScript, compile_script};

#[derive(Parser)]
#[command(author, version, about = "Compile Nolan narrative scripts into tapes.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a script and write one file per tape.
    Compile(CompileArgs),
    /// Compile a script and list unresolved text and route references.
    Check(CheckArgs),
}

#[derive(Args)]
struct CompileArgs {
    /// Script source file.
    script: PathBuf,
    /// Directory receiving one `<label>.<format>` file per tape.
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,
    /// Artifact encoding.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
    /// Also write the sorted tag identifiers to FILE as a JSON array.
    #[arg(long, value_name = "FILE")]
    tags: Option<PathBuf>,
}

#[derive(Args)]
struct CheckArgs {
    /// Script source file.
    script: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Ron,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Ron => "ron",
        }
    }

    fn encode(self, tape: &Tape) -> Result<String> {
        match self {
            Format::Json => serde_json::to_string_pretty(tape).context("encoding tape as JSON"),
            Format::Ron => {
                ron::ser::to_string_pretty(tape, ron::ser::PrettyConfig::default()).context("encoding tape as RON")
            },
        }
    }
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Compile(args) => run_compile(&args).map(|()| ExitCode::SUCCESS),
        Commands::Check(args) => run_check(&args),
    }
}

fn read_script(path: &Path) -> Result<CompiledScript> {
    let source = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    compile_script(&source).with_context(|| format!("compiling {}", path.display()))
}

fn run_compile(args: &CompileArgs) -> Result<()> {
    let compiled = read_script(&args.script)?;
    fs::create_dir_all(&args.out_dir).with_context(|| format!("creating {}", args.out_dir.display()))?;

    for tape in &compiled.tapes {
        for problem in validate_tape(tape) {
            warn!("tape '{}': {problem}", tape.label);
        }
        let out = args
            .out_dir
            .join(format!("{}.{}", tape.label, args.format.extension()));
        fs::write(&out, args.format.encode(tape)?).with_context(|| format!("writing {}", out.display()))?;
        info!("wrote {}", out.display());
        println!("{} -> {}", tape.label, out.display());
    }

    if let Some(path) = &args.tags {
        let json = serde_json::to_string_pretty(&compiled.registry.sorted()).context("encoding tag list")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {} tag identifiers to {}", compiled.registry.len(), path.display());
    }
    Ok(())
}

fn run_check(args: &CheckArgs) -> Result<ExitCode> {
    let compiled = read_script(&args.script)?;
    let mut problems = 0;
    for tape in &compiled.tapes {
        for problem in validate_tape(tape) {
            println!("{}: {problem}", tape.label);
            problems += 1;
        }
    }

    if problems > 0 {
        println!("{problems} problem(s) in {}", args.script.display());
        return Ok(ExitCode::FAILURE);
    }
    println!("ok: {} tape(s), {} rule(s)", compiled.tapes.len(), compiled.tapes.iter().map(|t| t.rules.len()).sum::<usize>());
    Ok(ExitCode::SUCCESS)
}
