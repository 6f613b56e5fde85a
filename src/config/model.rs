// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{Command, CommandId};
use crate::watch::path_utils::absolutize;

/// Top-level command file as read from YAML.
///
/// ```yaml
/// commands:
///   - cmd: "cargo test"
///     watch_paths: [./src, ./tests]
///     ignore_paths: [./src/generated]
/// ```
///
/// Unknown top-level keys (for example a theme selection consumed by a UI)
/// are ignored.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

/// One `commands:` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    /// Shell command text, run verbatim through the system shell.
    pub cmd: String,

    /// Directories whose writes retrigger the command. Must be non-empty.
    #[serde(default)]
    pub watch_paths: Vec<String>,

    /// Subtrees excluded from the watch set.
    #[serde(default)]
    pub ignore_paths: Vec<String>,
}

/// A validated command whose paths have been made absolute, before it is
/// given an id by the command filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub cmd: String,
    pub watch_paths: Vec<PathBuf>,
    pub ignore_paths: Vec<PathBuf>,
}

impl CommandSpec {
    /// Resolve every path in `raw` against `cwd`.
    pub fn from_config(raw: &CommandConfig, cwd: &Path) -> Self {
        let abs = |paths: &[String]| {
            paths
                .iter()
                .map(|p| absolutize(Path::new(p), cwd))
                .collect::<Vec<_>>()
        };
        Self {
            cmd: raw.cmd.clone(),
            watch_paths: abs(&raw.watch_paths),
            ignore_paths: abs(&raw.ignore_paths),
        }
    }

    pub fn into_command(self, id: CommandId) -> Command {
        Command::new(id, self.cmd, self.watch_paths, self.ignore_paths)
    }
}
