// src/watch/observer.rs

//! The native file-change notification capability.
//!
//! A [`FileObserver`] is told which directories to watch and reports what
//! happens in them over two channels, one for events and one for errors.
//! Production code uses [`NotifyObserver`] (backed by `notify`); tests plug
//! in a channel-driven fake through [`ObserverFactory`].

use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::errors::{Error, Result};

/// Kind of change reported for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// File content was written.
    Write,
    Create,
    Remove,
    Rename,
    /// Metadata-only change (permissions, timestamps, ...).
    Chmod,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Receiving side of an observer: changes and errors arrive separately.
#[derive(Debug)]
pub struct ObserverStreams {
    pub events: mpsc::UnboundedReceiver<FsEvent>,
    pub errors: mpsc::UnboundedReceiver<Error>,
}

/// A registration handle onto the platform's file notification facility.
pub trait FileObserver: Send {
    /// Start observing a single directory (non-recursively).
    fn watch(&mut self, dir: &Path) -> Result<()>;

    /// Stop observing a directory previously passed to [`watch`](Self::watch).
    fn unwatch(&mut self, dir: &Path) -> Result<()>;
}

/// Creates one independent observer per watch session.
pub trait ObserverFactory: Send + Sync {
    fn create(&self) -> Result<(Box<dyn FileObserver>, ObserverStreams)>;
}

/// [`FileObserver`] on top of `notify`'s recommended platform watcher.
pub struct NotifyObserver {
    inner: RecommendedWatcher,
}

impl std::fmt::Debug for NotifyObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyObserver").finish()
    }
}

impl NotifyObserver {
    pub fn new() -> Result<(Self, ObserverStreams)> {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<FsEvent>();
        let (error_tx, error_rx) = mpsc::unbounded_channel::<Error>();

        // Called synchronously on notify's own thread.
        let inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let kind = classify(&event.kind);
                    for path in event.paths {
                        // Receiver gone means the session is shutting down.
                        let _ = event_tx.send(FsEvent { path, kind });
                    }
                }
                Err(err) => {
                    let _ = error_tx.send(Error::from(err));
                }
            },
            Config::default(),
        )?;

        Ok((
            Self { inner },
            ObserverStreams {
                events: event_rx,
                errors: error_rx,
            },
        ))
    }
}

impl FileObserver for NotifyObserver {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        self.inner.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn unwatch(&mut self, dir: &Path) -> Result<()> {
        self.inner.unwatch(dir)?;
        Ok(())
    }
}

/// Factory handing out a fresh [`NotifyObserver`] per session.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyObserverFactory;

impl ObserverFactory for NotifyObserverFactory {
    fn create(&self) -> Result<(Box<dyn FileObserver>, ObserverStreams)> {
        let (observer, streams) = NotifyObserver::new()?;
        Ok((Box::new(observer), streams))
    }
}

/// Map a `notify` event kind onto the coarse [`ChangeKind`] classes.
///
/// Some backends only report `Modify(Any)` for content writes, so it counts
/// as a write too.
pub fn classify(kind: &EventKind) -> ChangeKind {
    match kind {
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
            ChangeKind::Write
        }
        EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::Chmod,
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Rename,
        EventKind::Create(_) => ChangeKind::Create,
        EventKind::Remove(_) => ChangeKind::Remove,
        _ => ChangeKind::Other,
    }
}
