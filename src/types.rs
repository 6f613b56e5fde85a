// src/types.rs

//! Core data model shared by the watch, exec and engine layers.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Dense index of a command in the filtered configuration (`0..N-1`).
pub type CommandId = usize;

/// Output shown for a successful run that printed nothing.
pub const NO_OUTPUT_PLACEHOLDER: &str = "No output";

/// Output carried by a run that was cancelled before it finished.
pub const CANCELLED_MARKER: &str = "Command canceled";

/// A configured shell command and the paths that retrigger it.
///
/// Immutable after construction. Paths are already absolute and cleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: CommandId,
    pub cmd: String,
    pub watch_paths: Vec<PathBuf>,
    pub ignore_paths: Vec<PathBuf>,
}

impl Command {
    pub fn new(
        id: CommandId,
        cmd: impl Into<String>,
        watch_paths: Vec<PathBuf>,
        ignore_paths: Vec<PathBuf>,
    ) -> Self {
        Self {
            id,
            cmd: cmd.into(),
            watch_paths,
            ignore_paths,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Pending => "Pending",
            RunStatus::Succeeded => "Succeeded",
            RunStatus::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// One status report for one execution attempt of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub command_id: CommandId,
    pub cmd: String,
    pub status: RunStatus,
    pub duration: Duration,
    pub output: String,
}

impl RunResult {
    /// The "running" report emitted before a process is started.
    pub fn pending(command: &Command) -> Self {
        Self {
            command_id: command.id,
            cmd: command.cmd.clone(),
            status: RunStatus::Pending,
            duration: Duration::ZERO,
            output: String::new(),
        }
    }

    pub fn succeeded(command: &Command, duration: Duration, stdout: String) -> Self {
        let output = if stdout.is_empty() {
            NO_OUTPUT_PLACEHOLDER.to_string()
        } else {
            stdout
        };
        Self {
            command_id: command.id,
            cmd: command.cmd.clone(),
            status: RunStatus::Succeeded,
            duration,
            output,
        }
    }

    pub fn failed(command: &Command, duration: Duration, output: String) -> Self {
        Self {
            command_id: command.id,
            cmd: command.cmd.clone(),
            status: RunStatus::Failed,
            duration,
            output,
        }
    }

    pub fn cancelled(command: &Command, duration: Duration) -> Self {
        Self::failed(command, duration, CANCELLED_MARKER.to_string())
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Failed && self.output == CANCELLED_MARKER
    }
}
