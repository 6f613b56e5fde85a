// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! Watch sessions and the orchestrator hand commands to an [`Executor`]
//! instead of spawning processes themselves. This makes it easy to swap in a
//! fake executor in tests while keeping the production implementation in
//! [`ProcessExecutor`].

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::StatusTx;
use crate::exec::runner::ProcessRunner;
use crate::types::Command;

/// Starts one run of a command in the background.
///
/// The returned handle completes once that run has delivered its terminal
/// result. Cancelling `cancel` must end the run promptly.
pub trait Executor: Send + Sync + 'static {
    fn launch(&self, command: Arc<Command>, cancel: CancellationToken) -> JoinHandle<()>;
}

/// Real executor: every launch is a [`ProcessRunner`] invocation on its own
/// Tokio task.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    runner: Arc<ProcessRunner>,
}

impl ProcessExecutor {
    pub fn new(status_tx: StatusTx) -> Self {
        Self {
            runner: Arc::new(ProcessRunner::new(status_tx)),
        }
    }
}

impl Executor for ProcessExecutor {
    fn launch(&self, command: Arc<Command>, cancel: CancellationToken) -> JoinHandle<()> {
        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move {
            runner.run(command, cancel).await;
        })
    }
}
