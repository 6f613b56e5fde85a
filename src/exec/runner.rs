// src/exec/runner.rs

//! Single execution of one command.

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as ShellCommand;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::StatusTx;
use crate::exec::group::{PlatformKiller, ProcessTreeKiller};
use crate::types::{Command, RunResult};

/// Upper bound on how long a killed child is waited on to be reaped.
const REAP_GRACE: Duration = Duration::from_millis(500);

/// Runs commands through the system shell, each in its own process group,
/// and reports every attempt to the status sink.
///
/// For each call to [`run`](Self::run) the sink receives a `Pending` result
/// first and then exactly one terminal result.
pub struct ProcessRunner<K: ProcessTreeKiller = PlatformKiller> {
    killer: K,
    status_tx: StatusTx,
}

impl<K: ProcessTreeKiller> std::fmt::Debug for ProcessRunner<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRunner").finish_non_exhaustive()
    }
}

impl ProcessRunner<PlatformKiller> {
    pub fn new(status_tx: StatusTx) -> Self {
        Self::with_killer(PlatformKiller::default(), status_tx)
    }
}

impl<K: ProcessTreeKiller> ProcessRunner<K> {
    pub fn with_killer(killer: K, status_tx: StatusTx) -> Self {
        Self { killer, status_tx }
    }

    /// Execute `command` until it exits or `cancel` fires.
    ///
    /// The terminal result is also returned to the caller.
    pub async fn run(&self, command: Arc<Command>, cancel: CancellationToken) -> RunResult {
        self.report(RunResult::pending(&command)).await;
        let result = self.execute(&command, &cancel).await;
        self.report(result.clone()).await;
        result
    }

    async fn execute(&self, command: &Command, cancel: &CancellationToken) -> RunResult {
        let mut cmd = shell_command(&command.cmd);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.killer.prepare(&mut cmd);

        info!(command = command.id, cmd = %command.cmd, "starting command process");

        let start = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!(command = command.id, error = %err, "failed to spawn command");
                return RunResult::failed(command, start.elapsed(), err.to_string());
            }
        };

        // Also the process group id; kept because `child.id()` turns `None`
        // once the shell is reaped, even if its background children live on.
        let leader_pid = child.id();

        let mut stdout = capture(child.stdout.take());
        let mut stderr = capture(child.stderr.take());

        // Output is only complete once both pipes hit EOF, which can be after
        // the shell itself exited if it left background children behind.
        let finished = async {
            let status = child.wait().await;
            let elapsed = start.elapsed();
            let out = join_output(&mut stdout).await;
            let err = join_output(&mut stderr).await;
            (status, elapsed, out, err)
        };

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                let elapsed = start.elapsed();
                info!(command = command.id, "run cancelled; killing process group");

                let killed = match (child.id(), leader_pid) {
                    (Some(pid), _) => self.killer.kill_tree(pid),
                    (None, Some(pid)) => {
                        debug!(command = command.id, pid, "shell already reaped; killing its group");
                        self.killer.kill_orphaned_group(pid)
                    }
                    (None, None) => Ok(()),
                };
                if let Err(err) = killed {
                    warn!(command = command.id, error = %err, "process group kill failed");
                    let _ = child.start_kill();
                }

                stdout.abort();
                stderr.abort();
                let _ = tokio::time::timeout(REAP_GRACE, child.wait()).await;

                RunResult::cancelled(command, elapsed)
            }

            (status, elapsed, out, err) = finished => {
                match status {
                    Ok(status) if status.success() => {
                        info!(command = command.id, ?elapsed, "command succeeded");
                        RunResult::succeeded(command, elapsed, out)
                    }
                    Ok(status) => {
                        info!(command = command.id, exit_code = ?status.code(), ?elapsed, "command failed");
                        RunResult::failed(command, elapsed, format!("{err}\n{out}"))
                    }
                    Err(wait_err) => {
                        warn!(command = command.id, error = %wait_err, "waiting for command failed");
                        RunResult::failed(command, elapsed, wait_err.to_string())
                    }
                }
            }
        }
    }

    async fn report(&self, result: RunResult) {
        if self.status_tx.send(result).await.is_err() {
            debug!("status sink closed; dropping run result");
        }
    }
}

/// Build a shell command appropriate for the platform; the text is passed
/// through verbatim as one shell expression.
fn shell_command(text: &str) -> ShellCommand {
    if cfg!(windows) {
        let mut c = ShellCommand::new("cmd");
        c.arg("/C").arg(text);
        c
    } else {
        let mut c = ShellCommand::new("sh");
        c.arg("-c").arg(text);
        c
    }
}

fn capture<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(err) = pipe.read_to_end(&mut buf).await {
                debug!(error = %err, "reading command output failed");
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn join_output(handle: &mut JoinHandle<String>) -> String {
    handle.await.unwrap_or_default()
}
