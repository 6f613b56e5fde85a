#![allow(dead_code)]

use std::path::{Path, PathBuf};

use panopticon::config::CommandSpec;
use panopticon::types::{Command, CommandId};

/// Builder for `Command` / `CommandSpec` to simplify test setup.
///
/// Paths are used as given; pass absolute paths (e.g. under a `TempDir`).
pub struct CommandBuilder {
    id: CommandId,
    cmd: String,
    watch: Vec<PathBuf>,
    ignore: Vec<PathBuf>,
}

impl CommandBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            id: 0,
            cmd: cmd.to_string(),
            watch: vec![],
            ignore: vec![],
        }
    }

    pub fn id(mut self, id: CommandId) -> Self {
        self.id = id;
        self
    }

    pub fn watch(mut self, path: impl AsRef<Path>) -> Self {
        self.watch.push(path.as_ref().to_path_buf());
        self
    }

    pub fn ignore(mut self, path: impl AsRef<Path>) -> Self {
        self.ignore.push(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Command {
        Command::new(self.id, self.cmd, self.watch, self.ignore)
    }

    pub fn build_spec(self) -> CommandSpec {
        CommandSpec {
            cmd: self.cmd,
            watch_paths: self.watch,
            ignore_paths: self.ignore,
        }
    }
}

/// Build `n` commands with ids `0..n`, all watching `dir`.
pub fn commands_watching(dir: &Path, cmds: &[&str]) -> Vec<Command> {
    cmds.iter()
        .enumerate()
        .map(|(id, cmd)| CommandBuilder::new(cmd).id(id).watch(dir).build())
        .collect()
}
