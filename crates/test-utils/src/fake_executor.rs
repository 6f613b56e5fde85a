use std::sync::{Arc, Mutex};
use std::time::Duration;

use panopticon::engine::StatusTx;
use panopticon::exec::Executor;
use panopticon::types::{Command, CommandId, RunResult};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How a fake run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeRunMode {
    /// Stay "running" until the token is cancelled.
    HoldUntilCancelled,
    /// Succeed straight away.
    CompleteImmediately,
}

/// One recorded call to [`Executor::launch`].
#[derive(Debug, Clone)]
pub struct Launch {
    pub command_id: CommandId,
    pub cancel: CancellationToken,
}

/// A fake executor that:
/// - records every launch together with its cancellation token
/// - optionally reports `Pending` and a terminal result like the real one
#[derive(Clone)]
pub struct RecordingExecutor {
    mode: FakeRunMode,
    status_tx: Option<StatusTx>,
    launches: Arc<Mutex<Vec<Launch>>>,
}

impl RecordingExecutor {
    pub fn new(mode: FakeRunMode) -> Self {
        Self {
            mode,
            status_tx: None,
            launches: Arc::default(),
        }
    }

    pub fn with_status(mut self, status_tx: StatusTx) -> Self {
        self.status_tx = Some(status_tx);
        self
    }

    pub fn launches(&self) -> Vec<Launch> {
        self.launches.lock().unwrap().clone()
    }

    pub fn launch_count(&self) -> usize {
        self.launches.lock().unwrap().len()
    }

    pub fn launches_of(&self, id: CommandId) -> Vec<Launch> {
        self.launches()
            .into_iter()
            .filter(|l| l.command_id == id)
            .collect()
    }

    /// Poll until at least `n` launches were recorded or `limit` elapses.
    pub async fn wait_for_launches(&self, n: usize, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while self.launch_count() < n {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        true
    }
}

impl Executor for RecordingExecutor {
    fn launch(&self, command: Arc<Command>, cancel: CancellationToken) -> JoinHandle<()> {
        self.launches.lock().unwrap().push(Launch {
            command_id: command.id,
            cancel: cancel.clone(),
        });

        let mode = self.mode;
        let status_tx = self.status_tx.clone();
        tokio::spawn(async move {
            if let Some(tx) = &status_tx {
                let _ = tx.send(RunResult::pending(&command)).await;
            }

            let result = match mode {
                FakeRunMode::CompleteImmediately => {
                    RunResult::succeeded(&command, Duration::ZERO, String::new())
                }
                FakeRunMode::HoldUntilCancelled => {
                    cancel.cancelled().await;
                    RunResult::cancelled(&command, Duration::ZERO)
                }
            };

            if let Some(tx) = &status_tx {
                let _ = tx.send(result).await;
            }
        })
    }
}
