// src/watch/session.rs

//! One watch session per command: an observer bound to the command's
//! resolved directories, and the cancel-and-restart loop driving its runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::Error;
use crate::exec::Executor;
use crate::types::{Command, CommandId};
use crate::watch::observer::{ChangeKind, FileObserver, FsEvent, ObserverFactory};
use crate::watch::resolver::resolve;

/// How long a closing session waits for its cancelled run to report.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Capacity of the per-session manual trigger queue.
const TRIGGER_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Watching, nothing running.
    Idle,
    /// A run is outstanding.
    Running,
    /// Shut down; terminal.
    Closed,
}

/// Decides which file events should restart a command.
///
/// Only content writes qualify, and never writes to a path containing one of
/// the excluded names (the tool's own log file, for example).
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    excluded_names: Vec<String>,
}

impl EventFilter {
    pub fn new<I, S>(excluded_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_names: excluded_names
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    pub fn qualifies(&self, event: &FsEvent) -> bool {
        if event.kind != ChangeKind::Write {
            return false;
        }
        let path = event.path.to_string_lossy();
        !self
            .excluded_names
            .iter()
            .any(|name| path.contains(name.as_str()))
    }
}

struct InFlight {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// A command's observer plus the state needed to restart its runs.
///
/// Construction resolves and registers the watch set; [`spawn`](Self::spawn)
/// moves the session onto its own Tokio task.
pub struct WatchSession<E: Executor> {
    command: Arc<Command>,
    executor: Arc<E>,
    filter: EventFilter,
    observer: Option<Box<dyn FileObserver>>,
    events: Option<mpsc::UnboundedReceiver<FsEvent>>,
    errors: Option<mpsc::UnboundedReceiver<Error>>,
    watched: Vec<PathBuf>,
    inflight: Option<InFlight>,
}

impl<E: Executor> std::fmt::Debug for WatchSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("command", &self.command.id)
            .field("watched", &self.watched.len())
            .finish_non_exhaustive()
    }
}

impl<E: Executor> WatchSession<E> {
    /// Resolve the command's watch set and register it with a new observer.
    ///
    /// Directories that fail to register are logged and left out. If no
    /// observer can be created at all the session still works, it just never
    /// triggers on file changes.
    pub fn new(
        command: Arc<Command>,
        observers: &dyn ObserverFactory,
        filter: EventFilter,
        executor: Arc<E>,
    ) -> Self {
        let resolved = resolve(&command.watch_paths, &command.ignore_paths);

        let (mut observer, events, errors) = match observers.create() {
            Ok((observer, streams)) => (Some(observer), Some(streams.events), Some(streams.errors)),
            Err(err) => {
                error!(command = command.id, error = %err, "could not create file observer");
                (None, None, None)
            }
        };

        let mut watched = Vec::with_capacity(resolved.len());
        if let Some(observer) = observer.as_mut() {
            for dir in resolved {
                match observer.watch(&dir) {
                    Ok(()) => {
                        debug!(command = command.id, dir = ?dir, "watching");
                        watched.push(dir);
                    }
                    Err(err) => {
                        warn!(command = command.id, dir = ?dir, error = %err, "error watching directory");
                    }
                }
            }
        }

        if watched.is_empty() {
            warn!(
                command = command.id,
                cmd = %command.cmd,
                "no directories observed; command only runs when triggered manually"
            );
        } else {
            info!(command = command.id, cmd = %command.cmd, dirs = watched.len(), "watch session ready");
        }

        Self {
            command,
            executor,
            filter,
            observer,
            events,
            errors,
            watched,
            inflight: None,
        }
    }

    pub fn command(&self) -> &Arc<Command> {
        &self.command
    }

    /// Directories that were registered successfully.
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }

    /// Start the event loop. It ends once `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> SessionHandle {
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_CAPACITY);
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let command_id = self.command.id;

        let join = tokio::spawn(self.run_loop(shutdown, trigger_rx, state_tx));

        SessionHandle {
            command_id,
            trigger_tx,
            state: state_rx,
            join,
        }
    }

    async fn run_loop(
        mut self,
        shutdown: CancellationToken,
        mut triggers: mpsc::Receiver<()>,
        state: watch::Sender<SessionState>,
    ) {
        let mut events = self.events.take();
        let mut errors = self.errors.take();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                Some(()) = triggers.recv() => {
                    debug!(command = self.command.id, "manual trigger");
                    self.restart(&shutdown, &state);
                }

                event = recv_or_pending(&mut events) => match event {
                    Some(event) if self.filter.qualifies(&event) => {
                        debug!(command = self.command.id, path = ?event.path, "qualifying write; restarting");
                        self.restart(&shutdown, &state);
                    }
                    Some(event) => {
                        debug!(command = self.command.id, path = ?event.path, kind = ?event.kind, "ignoring event");
                    }
                    None => {
                        debug!(command = self.command.id, "observer event stream closed");
                        events = None;
                    }
                },

                err = recv_or_pending(&mut errors) => match err {
                    Some(err) => warn!(command = self.command.id, error = %err, "watcher error"),
                    None => errors = None,
                },

                _ = join_inflight(&mut self.inflight) => {
                    self.inflight = None;
                    state.send_replace(SessionState::Idle);
                }
            }
        }

        self.close(&state).await;
    }

    /// Cancel whatever is running and start a fresh run under a new token.
    fn restart(&mut self, shutdown: &CancellationToken, state: &watch::Sender<SessionState>) {
        if let Some(previous) = self.inflight.take() {
            previous.cancel.cancel();
        }

        let cancel = shutdown.child_token();
        let handle = self
            .executor
            .launch(Arc::clone(&self.command), cancel.clone());
        self.inflight = Some(InFlight { cancel, handle });
        state.send_replace(SessionState::Running);
    }

    async fn close(mut self, state: &watch::Sender<SessionState>) {
        if let Some(inflight) = self.inflight.take() {
            inflight.cancel.cancel();
            if tokio::time::timeout(CLOSE_GRACE, inflight.handle).await.is_err() {
                warn!(command = self.command.id, "in-flight run did not finish within grace period");
            }
        }

        if let Some(mut observer) = self.observer.take() {
            for dir in &self.watched {
                if let Err(err) = observer.unwatch(dir) {
                    debug!(command = self.command.id, dir = ?dir, error = %err, "unwatch failed");
                }
            }
        }

        state.send_replace(SessionState::Closed);
        info!(command = self.command.id, "watch session closed");
    }
}

async fn recv_or_pending<T>(rx: &mut Option<mpsc::UnboundedReceiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn join_inflight(inflight: &mut Option<InFlight>) {
    match inflight {
        Some(run) => {
            if let Err(err) = (&mut run.handle).await {
                debug!(error = %err, "run task ended abnormally");
            }
        }
        None => std::future::pending().await,
    }
}

/// Owner-side handle onto a spawned [`WatchSession`].
#[derive(Debug)]
pub struct SessionHandle {
    command_id: CommandId,
    trigger_tx: mpsc::Sender<()>,
    state: watch::Receiver<SessionState>,
    join: JoinHandle<()>,
}

impl SessionHandle {
    pub fn command_id(&self) -> CommandId {
        self.command_id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Ask the session to cancel its current run and start a new one.
    ///
    /// Returns `false` if the session has already closed.
    pub async fn trigger(&self) -> bool {
        self.trigger_tx.send(()).await.is_ok()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the session task to end, giving up after `grace`.
    pub async fn join(self, grace: Duration) {
        let id = self.command_id;
        match tokio::time::timeout(grace, self.join).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(command = id, error = %err, "watch session task failed"),
            Err(_) => warn!(command = id, "watch session did not close within grace period"),
        }
    }
}
