// src/exec/group.rs

//! Process-group lifecycle: put a spawned shell into its own group and kill
//! the whole tree it spawned.
//!
//! One capability, two implementations picked at build time:
//! - Unix: `setpgid` at spawn, then `SIGKILL` to the group.
//! - Windows: a new process group at spawn, then `taskkill /F /T` on the root
//!   process id.

use std::io;

use tokio::process::Command;

/// Spawn-time setup and forced termination of a command's process tree.
pub trait ProcessTreeKiller: Send + Sync {
    /// Configure `cmd` so the spawned process leads its own group.
    fn prepare(&self, cmd: &mut Command);

    /// Forcefully terminate `pid` and everything it spawned.
    ///
    /// A process that no longer exists counts as killed.
    fn kill_tree(&self, pid: u32) -> io::Result<()>;

    /// Kill what is left of the group `pid` led, after the leader itself
    /// has already been reaped.
    ///
    /// Descendants that still hold the group keep it alive, so the id cannot
    /// have been reused while any of them run.
    fn kill_orphaned_group(&self, pid: u32) -> io::Result<()>;
}

#[cfg(unix)]
pub type PlatformKiller = ProcessGroupKiller;

#[cfg(windows)]
pub type PlatformKiller = TaskTreeKiller;

/// POSIX process groups.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessGroupKiller;

#[cfg(unix)]
impl ProcessTreeKiller for ProcessGroupKiller {
    fn prepare(&self, cmd: &mut Command) {
        cmd.process_group(0);
    }

    fn kill_tree(&self, pid: u32) -> io::Result<()> {
        let pid = pid as libc::pid_t;

        // SAFETY: getpgid/getpgrp only read process bookkeeping.
        let pgid = unsafe { libc::getpgid(pid) };
        let own_pgid = unsafe { libc::getpgrp() };

        // Unknown group, or the child never left ours: only the child itself
        // can be targeted safely.
        if pgid <= 0 || pgid == own_pgid {
            tracing::debug!(pid, pgid, "process group unavailable; killing child only");
            return kill_pid(pid);
        }

        // SAFETY: plain syscall; the negative-pid form is not used.
        let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
        if rc == 0 {
            return Ok(());
        }
        ignore_missing(io::Error::last_os_error())
    }

    fn kill_orphaned_group(&self, pid: u32) -> io::Result<()> {
        // Spawned with `process_group(0)`, so the group id is the leader's pid.
        let pgid = pid as libc::pid_t;
        if pgid <= 0 || pgid == unsafe { libc::getpgrp() } {
            return Ok(());
        }

        // SAFETY: plain syscall on a group we created.
        let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
        if rc == 0 {
            return Ok(());
        }
        ignore_missing(io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn kill_pid(pid: libc::pid_t) -> io::Result<()> {
    // SAFETY: plain syscall on a pid we spawned.
    let rc = unsafe { libc::kill(pid, libc::SIGKILL) };
    if rc == 0 {
        return Ok(());
    }
    ignore_missing(io::Error::last_os_error())
}

#[cfg(unix)]
fn ignore_missing(err: io::Error) -> io::Result<()> {
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(())
    } else {
        Err(err)
    }
}

/// Windows task trees.
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskTreeKiller;

#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

// taskkill exit code when the pid does not exist.
#[cfg(windows)]
const TASKKILL_NOT_FOUND: i32 = 128;

#[cfg(windows)]
impl ProcessTreeKiller for TaskTreeKiller {
    fn prepare(&self, cmd: &mut Command) {
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }

    fn kill_tree(&self, pid: u32) -> io::Result<()> {
        let status = std::process::Command::new("taskkill")
            .args(["/F", "/T", "/PID", &pid.to_string()])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()?;

        match status.code() {
            Some(0) | Some(TASKKILL_NOT_FOUND) => Ok(()),
            code => Err(io::Error::other(format!(
                "taskkill for pid {pid} exited with {code:?}"
            ))),
        }
    }

    fn kill_orphaned_group(&self, pid: u32) -> io::Result<()> {
        // Best effort: without the root process taskkill cannot walk the tree.
        self.kill_tree(pid)
    }
}
