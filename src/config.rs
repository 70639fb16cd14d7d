//! mm configuration.
//!
//! Loaded from `.mmconfig` beside the log. The file is optional; a missing
//! file means defaults. Older `KEY=VALUE` files (`SCRIPT_DIRS=scripts bin`)
//! are still read.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::debug;

/// mm configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Directories, relative to the root, that hold scripts.
    ///
    /// When set, the first command argument found inside one of these
    /// directories is recorded as the program instead of the command word.
    #[serde(default)]
    pub script_dirs: Vec<PathBuf>,
}

impl Config {
    /// Load config from `path`, falling back to defaults if it is absent.
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => Self::from_key_values(&contents).ok_or_else(|| {
                format!(
                    "invalid config at {}: {e}\nexpected TOML such as `script-dirs = [\"scripts\"]`",
                    path.display()
                )
            }),
        }
    }

    /// Reads the `KEY=VALUE` format, where `SCRIPT_DIRS` lists directories
    /// separated by spaces. Other upper-case keys are ignored. Returns `None`
    /// if any line is not of that form.
    fn from_key_values(contents: &str) -> Option<Self> {
        let mut config = Self::default();
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
                return None;
            }
            if key == "SCRIPT_DIRS" {
                config.script_dirs = value.split_whitespace().map(PathBuf::from).collect();
            }
        }
        debug!("read key-value config");
        Some(config)
    }
}
