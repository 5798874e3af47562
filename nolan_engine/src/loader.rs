//! Loading tapes from compiled artifacts or straight from script source.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::{info, warn};
use nolan_data::{Tape, validate_tape};
use nolan_script::compile_script;

/// Read every tape in `path`.
///
/// `.json` and `.ron` files are compiled artifacts; anything else is compiled
/// as script source. Validation problems are logged, not fatal.
///
/// # Errors
/// The file cannot be read, decoded or compiled, or holds no tape.
pub fn load_tapes(path: &Path) -> Result<Vec<Tape>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading '{}'", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let tapes = match extension.as_deref() {
        Some("json") => match serde_json::from_str::<Vec<Tape>>(&text) {
            Ok(tapes) => tapes,
            Err(_) => vec![
                serde_json::from_str::<Tape>(&text)
                    .with_context(|| format!("decoding JSON tape '{}'", path.display()))?,
            ],
        },
        Some("ron") => match ron::from_str::<Vec<Tape>>(&text) {
            Ok(tapes) => tapes,
            Err(_) => vec![ron::from_str::<Tape>(&text).with_context(|| format!("decoding RON tape '{}'", path.display()))?],
        },
        _ => {
            compile_script(&text)
                .with_context(|| format!("compiling '{}'", path.display()))?
                .tapes
        },
    };

    if tapes.is_empty() {
        bail!("'{}' holds no tape", path.display());
    }
    for tape in &tapes {
        for problem in validate_tape(tape) {
            warn!("tape '{}': {problem}", tape.label);
        }
    }
    info!("loaded {} tape(s) from '{}'", tapes.len(), path.display());
    Ok(tapes)
}

/// Pick `label` (ignoring case) or the first tape.
///
/// # Errors
/// No tape carries `label`.
pub fn select_tape(tapes: Vec<Tape>, label: Option<&str>) -> Result<Tape> {
    let Some(label) = label else {
        return tapes.into_iter().next().context("no tape to play");
    };
    let known: Vec<String> = tapes.iter().map(|t| t.label.clone()).collect();
    tapes
        .into_iter()
        .find(|t| t.label.eq_ignore_ascii_case(label))
        .with_context(|| format!("no tape '{label}' (have: {})", known.join(", ")))
}
