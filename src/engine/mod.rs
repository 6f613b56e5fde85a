// src/engine/mod.rs

//! Orchestration engine for panopticon.
//!
//! This module ties together:
//! - the orchestrator owning one watch session per command and the shared
//!   shutdown token
//! - the status store kept by the sink side
//! - the console front end that renders results and turns operator input
//!   into control messages
//!
//! Results only ever flow executor -> sink over [`StatusTx`]; control only
//! flows sink -> orchestrator as [`Control`] messages.

use tokio::sync::mpsc;

use crate::types::{CommandId, RunResult};

/// Sending half of the status channel, held by every runner.
pub type StatusTx = mpsc::Sender<RunResult>;

/// Receiving half of the status channel, owned by the sink.
pub type StatusRx = mpsc::Receiver<RunResult>;

/// Requests the front end can make of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Cancel the command's current run (if any) and start it again.
    RunNow(CommandId),
    /// Start every command now.
    RunAll,
    /// Tear everything down and exit.
    Shutdown,
}

pub mod console;
pub mod orchestrator;
pub mod status;

pub use console::{parse_control, read_controls, spawn_stdin_reader, status_line, ConsoleSink};
pub use orchestrator::{Orchestrator, OrchestratorOptions};
pub use status::StatusStore;
