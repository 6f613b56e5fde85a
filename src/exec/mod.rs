// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`runner`] runs one command through the shell and reports its
//!   `Pending` and terminal results.
//! - [`group`] is the platform process-group capability used to kill a
//!   command together with everything it spawned.
//! - [`backend`] provides the `Executor` trait and the `ProcessExecutor`
//!   used in production, which tests replace with a fake.

pub mod backend;
pub mod group;
pub mod runner;

pub use backend::{Executor, ProcessExecutor};
pub use group::{PlatformKiller, ProcessTreeKiller};
pub use runner::ProcessRunner;
