use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use panopticon::errors::{Error, Result};
use panopticon::watch::{FileObserver, FsEvent, ObserverFactory, ObserverStreams};
use tokio::sync::mpsc;

/// What one fake observer was asked to do, plus the senders that drive it.
#[derive(Clone)]
struct ObserverRecord {
    events: mpsc::UnboundedSender<FsEvent>,
    errors: mpsc::UnboundedSender<Error>,
    watched: Arc<Mutex<Vec<PathBuf>>>,
    unwatched: Arc<Mutex<Vec<PathBuf>>>,
}

#[derive(Default)]
struct FactoryState {
    observers: Vec<ObserverRecord>,
    fail_dirs: Vec<PathBuf>,
    fail_create: bool,
}

/// An [`ObserverFactory`] whose observers are driven by hand.
///
/// Observers are numbered in creation order, which matches command id order
/// when sessions are built by the orchestrator.
#[derive(Clone, Default)]
pub struct FakeObserverFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl FakeObserverFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `watch` fail for these directories.
    pub fn failing_dirs(self, dirs: &[&Path]) -> Self {
        self.state.lock().unwrap().fail_dirs = dirs.iter().map(|d| d.to_path_buf()).collect();
        self
    }

    /// Make every `create` call fail.
    pub fn failing_create(self) -> Self {
        self.state.lock().unwrap().fail_create = true;
        self
    }

    pub fn created(&self) -> usize {
        self.state.lock().unwrap().observers.len()
    }

    fn record(&self, index: usize) -> ObserverRecord {
        self.state.lock().unwrap().observers[index].clone()
    }

    /// Directories currently registered on observer `index`.
    pub fn watched(&self, index: usize) -> Vec<PathBuf> {
        self.record(index).watched.lock().unwrap().clone()
    }

    /// Directories observer `index` was told to stop watching.
    pub fn unwatched(&self, index: usize) -> Vec<PathBuf> {
        self.record(index).unwatched.lock().unwrap().clone()
    }

    /// Deliver an event to observer `index`. Returns `false` once it is gone.
    pub fn send_event(&self, index: usize, event: FsEvent) -> bool {
        self.record(index).events.send(event).is_ok()
    }

    pub fn send_error(&self, index: usize, message: &str) -> bool {
        self.record(index)
            .errors
            .send(anyhow::anyhow!(message.to_string()))
            .is_ok()
    }
}

impl ObserverFactory for FakeObserverFactory {
    fn create(&self) -> Result<(Box<dyn FileObserver>, ObserverStreams)> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(anyhow::anyhow!("observer creation disabled").into());
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let record = ObserverRecord {
            events: event_tx,
            errors: error_tx,
            watched: Arc::default(),
            unwatched: Arc::default(),
        };

        let observer = FakeObserver {
            watched: Arc::clone(&record.watched),
            unwatched: Arc::clone(&record.unwatched),
            fail_dirs: state.fail_dirs.clone(),
        };
        state.observers.push(record);

        Ok((
            Box::new(observer),
            ObserverStreams {
                events: event_rx,
                errors: error_rx,
            },
        ))
    }
}

struct FakeObserver {
    watched: Arc<Mutex<Vec<PathBuf>>>,
    unwatched: Arc<Mutex<Vec<PathBuf>>>,
    fail_dirs: Vec<PathBuf>,
}

impl FileObserver for FakeObserver {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        if self.fail_dirs.iter().any(|d| d == dir) {
            return Err(anyhow::anyhow!("cannot watch {}", dir.display()).into());
        }
        self.watched.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }

    fn unwatch(&mut self, dir: &Path) -> Result<()> {
        self.watched.lock().unwrap().retain(|d| d != dir);
        self.unwatched.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }
}
