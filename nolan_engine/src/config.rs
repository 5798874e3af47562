//! Player settings read from `nolan.toml`.
//!
//! Every key is optional:
//!
//! ```toml
//! wrap_width = 72
//! show_operations = true
//! line_editor = true
//! history = true
//! history_file = "/home/me/.nolan_history"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE: &str = "nolan.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayConfig {
    /// Column at which story text is wrapped.
    pub wrap_width: usize,
    /// Print the operations behind every action and choice.
    pub show_operations: bool,
    /// Read commands with a line editor (completion, history) when stdin is a terminal.
    pub line_editor: bool,
    /// Keep REPL history between sessions.
    pub history: bool,
    /// Where history is kept; defaults to `nolan/history.txt` in the user data directory.
    pub history_file: Option<PathBuf>,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            wrap_width: textwrap::termwidth(),
            show_operations: false,
            line_editor: true,
            history: true,
            history_file: None,
        }
    }
}

impl PlayConfig {
    /// History file to load and save, or `None` when history is off.
    pub fn history_path(&self) -> Option<PathBuf> {
        if !self.history {
            return None;
        }
        self.history_file
            .clone()
            .or_else(|| dirs::data_dir().map(|base| base.join("nolan").join("history.txt")))
    }

    /// Load settings from `path`; a missing file means defaults.
    ///
    /// # Errors
    /// The file exists but cannot be read or is not valid TOML for these settings.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("no config at '{}', using defaults", path.display());
                return Ok(Self::default());
            },
            Err(err) => return Err(err).with_context(|| format!("reading config '{}'", path.display())),
        };
        let config: PlayConfig =
            toml::from_str(&text).with_context(|| format!("parsing config '{}'", path.display()))?;
        info!("config loaded from '{}'", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlayConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, PlayConfig::default());
        assert!(config.history);
        assert!(config.line_editor);
        assert!(!config.show_operations);
    }

    #[test]
    fn history_file_can_be_moved_or_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "history_file = \"/var/tmp/nolan.history\"\nline_editor = false\n").unwrap();
        let config = PlayConfig::load(&path).unwrap();
        assert!(!config.line_editor);
        assert_eq!(config.history_path(), Some(PathBuf::from("/var/tmp/nolan.history")));

        let off = PlayConfig {
            history: false,
            ..config
        };
        assert_eq!(off.history_path(), None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "wrap_width = 60\nshow_operations = true\n").unwrap();
        let config = PlayConfig::load(&path).unwrap();
        assert_eq!(config.wrap_width, 60);
        assert!(config.show_operations);
        assert!(config.history);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "wrap_width = \"wide\"\n").unwrap();
        let err = PlayConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("parsing config"), "{err}");

        fs::write(&path, "colour = true\n").unwrap();
        assert!(PlayConfig::load(&path).is_err());
    }
}
