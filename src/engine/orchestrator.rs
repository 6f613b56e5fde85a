// src/engine/orchestrator.rs

//! Top-level owner of every watch session.
//!
//! The orchestrator creates one [`WatchSession`] per command, all sharing a
//! single root [`CancellationToken`]. Cancelling that token is the only way
//! the whole system shuts down: every session stops, every in-flight run is
//! cancelled and every process group is killed.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::{PanopticonError, Result};
use crate::exec::Executor;
use crate::types::{Command, CommandId};
use crate::watch::{EventFilter, ObserverFactory, SessionHandle, SessionState, WatchSession};

/// Pause after cancelling everything so kill signals can land.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// Upper bound on waiting for a single session to finish closing.
const SESSION_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Which file events restart a command.
    pub event_filter: EventFilter,
    /// Delay between cancelling the root token and joining the sessions.
    pub shutdown_grace: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            event_filter: EventFilter::default(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

#[derive(Debug)]
pub struct Orchestrator {
    commands: Vec<Arc<Command>>,
    sessions: Vec<SessionHandle>,
    root: CancellationToken,
    shutdown_grace: Duration,
    closed: bool,
}

impl Orchestrator {
    /// Start a watch session for each command.
    ///
    /// `commands` must already carry dense ids `0..N-1` in order. Must be
    /// called from within a Tokio runtime.
    pub fn new<E: Executor>(
        commands: Vec<Command>,
        observers: &dyn ObserverFactory,
        executor: Arc<E>,
        options: OrchestratorOptions,
    ) -> Self {
        let root = CancellationToken::new();
        let commands: Vec<Arc<Command>> = commands.into_iter().map(Arc::new).collect();

        let sessions = commands
            .iter()
            .map(|command| {
                WatchSession::new(
                    Arc::clone(command),
                    observers,
                    options.event_filter.clone(),
                    Arc::clone(&executor),
                )
                .spawn(root.clone())
            })
            .collect();

        info!(commands = commands.len(), "orchestrator started");

        Self {
            commands,
            sessions,
            root,
            shutdown_grace: options.shutdown_grace,
            closed: false,
        }
    }

    /// The watched commands, indexed by id.
    pub fn commands(&self) -> &[Arc<Command>] {
        &self.commands
    }

    /// Token whose cancellation tears the whole system down.
    pub fn cancel_token(&self) -> CancellationToken {
        self.root.clone()
    }

    pub fn session_state(&self, id: CommandId) -> Option<SessionState> {
        if self.closed {
            return self.commands.get(id).map(|_| SessionState::Closed);
        }
        self.sessions.get(id).map(SessionHandle::state)
    }

    /// Run one command now, cancelling its current run first.
    pub async fn run_now(&self, id: CommandId) -> Result<()> {
        let session = self
            .sessions
            .get(id)
            .ok_or(PanopticonError::UnknownCommand(id))?;
        if !session.trigger().await {
            debug!(command = id, "run requested after session closed");
        }
        Ok(())
    }

    /// Start every command now. Runs proceed concurrently.
    pub async fn run_all(&self) {
        for session in &self.sessions {
            if !session.trigger().await {
                debug!(command = session.command_id(), "run requested after session closed");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Cancel everything and wait for the sessions to close.
    ///
    /// Calling this more than once is harmless.
    pub async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        info!("shutting down");
        self.root.cancel();
        tokio::time::sleep(self.shutdown_grace).await;

        for session in self.sessions.drain(..) {
            session.join(SESSION_JOIN_TIMEOUT).await;
        }
        info!("all watch sessions closed");
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
