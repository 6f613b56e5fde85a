// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Resolving a command's watch/ignore paths into concrete directories.
//! - Wrapping the platform file observer (`notify`) behind a small trait.
//! - Running one watch session per command, which cancels and restarts the
//!   command's process whenever a watched file is written.
//!
//! It does not know about rendering; run results go straight from the
//! executor to the status sink.

pub mod observer;
pub mod path_utils;
pub mod resolver;
pub mod session;

pub use observer::{
    ChangeKind, FileObserver, FsEvent, NotifyObserver, NotifyObserverFactory, ObserverFactory,
    ObserverStreams,
};
pub use resolver::{resolve, ResolvedWatchSet};
pub use session::{EventFilter, SessionHandle, SessionState, WatchSession};
