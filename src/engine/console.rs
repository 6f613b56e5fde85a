// src/engine/console.rs

//! Line-oriented front end: prints status updates to a writer and turns
//! operator input into [`Control`] messages.
//!
//! Input lines:
//! - `r <id>` runs one command now
//! - `a` runs every command
//! - `q` quits

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::status::StatusStore;
use crate::engine::{Control, StatusRx};
use crate::types::{Command, RunResult, RunStatus};

fn emoji(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Pending => "⏳",
        RunStatus::Failed => "❌",
        RunStatus::Succeeded => "✅",
    }
}

/// Duration truncated to whole microseconds.
fn display_duration(d: Duration) -> String {
    let micros = u64::try_from(d.as_micros()).unwrap_or(u64::MAX);
    format!("{:?}", Duration::from_micros(micros))
}

/// Headline for one result, e.g. `✅ make finished in 1.2ms`.
pub fn status_line(result: &RunResult) -> String {
    let icon = emoji(result.status);
    match result.status {
        RunStatus::Succeeded => format!(
            "{icon} {} finished in {}",
            result.cmd,
            display_duration(result.duration)
        ),
        RunStatus::Failed => format!(
            "{icon} {} failed in {}",
            result.cmd,
            display_duration(result.duration)
        ),
        RunStatus::Pending => format!("{icon} {} running...", result.cmd),
    }
}

fn progress_line(store: &StatusStore) -> String {
    format!(
        "[{}/{}] {:.0}% complete",
        store.completed(),
        store.total(),
        store.progress() * 100.0
    )
}

/// Parse one line of operator input.
pub fn parse_control(line: &str) -> Option<Control> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?;
    let arg = parts.next();
    if parts.next().is_some() {
        return None;
    }

    match (verb, arg) {
        ("r", Some(id)) => id.parse().ok().map(Control::RunNow),
        ("a", None) => Some(Control::RunAll),
        ("q", None) => Some(Control::Shutdown),
        _ => None,
    }
}

/// Forward parsed control lines from `reader` into `tx` until EOF.
///
/// Blocking; call it from a plain thread, not a runtime worker.
pub fn read_controls<R: BufRead>(reader: R, tx: &mpsc::Sender<Control>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "failed to read control input");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_control(&line) {
            Some(control) => {
                if tx.blocking_send(control).is_err() {
                    return;
                }
                if control == Control::Shutdown {
                    return;
                }
            }
            None => warn!(input = %line.trim(), "unrecognised input; expected `r <id>`, `a` or `q`"),
        }
    }
    debug!("control input closed");
}

/// Read stdin on a detached thread so a pending read never holds up exit.
pub fn spawn_stdin_reader(tx: mpsc::Sender<Control>) {
    let spawned = std::thread::Builder::new()
        .name("panopticon-stdin".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            read_controls(stdin.lock(), &tx);
        });
    if let Err(err) = spawned {
        warn!(error = %err, "could not start stdin reader; keyboard control disabled");
    }
}

/// Consumes the status channel, keeps the [`StatusStore`] current and prints
/// each update.
#[derive(Debug)]
pub struct ConsoleSink {
    store: StatusStore,
}

impl ConsoleSink {
    pub fn new(commands: &[Arc<Command>]) -> Self {
        Self {
            store: StatusStore::new(commands),
        }
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// Print the command list with ids, for the operator's reference.
    pub fn print_banner<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for result in self.store.iter() {
            writeln!(out, "[{}] {}", result.command_id, result.cmd)?;
        }
        writeln!(out, "keys: r <id> = run now, a = run all, q = quit")?;
        out.flush()
    }

    /// Render one update. Terminal results include their output.
    pub fn render<W: Write>(&mut self, result: RunResult, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", status_line(&result))?;
        if result.status != RunStatus::Pending {
            let body = result.output.trim_end();
            if !body.is_empty() {
                writeln!(out, "{body}")?;
            }
        }

        if !self.store.apply(result) {
            debug!("status for unknown command dropped");
        }
        writeln!(out, "{}", progress_line(&self.store))?;
        out.flush()
    }

    /// Drain `rx` until every sender is gone; returns the final store.
    pub async fn run<W: Write>(mut self, mut rx: StatusRx, mut out: W) -> StatusStore {
        while let Some(result) = rx.recv().await {
            if let Err(err) = self.render(result, &mut out) {
                warn!(error = %err, "failed to write status");
            }
        }
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn command(id: usize, cmd: &str) -> Arc<Command> {
        Arc::new(Command::new(id, cmd, vec![], vec![]))
    }

    #[test]
    fn status_lines_match_each_state() {
        let c = command(0, "make");
        assert_eq!(status_line(&RunResult::pending(&c)), "⏳ make running...");

        let ok = RunResult::succeeded(&c, Duration::from_nanos(1_234_567), "out".into());
        assert_eq!(status_line(&ok), "✅ make finished in 1.234ms");

        let bad = RunResult::failed(&c, Duration::from_secs(2), "err".into());
        assert_eq!(status_line(&bad), "❌ make failed in 2s");
    }

    #[test]
    fn parses_control_lines() {
        assert_eq!(parse_control("r 3"), Some(Control::RunNow(3)));
        assert_eq!(parse_control("  r   0 "), Some(Control::RunNow(0)));
        assert_eq!(parse_control("a"), Some(Control::RunAll));
        assert_eq!(parse_control("q"), Some(Control::Shutdown));

        assert_eq!(parse_control("r"), None);
        assert_eq!(parse_control("r x"), None);
        assert_eq!(parse_control("r 1 2"), None);
        assert_eq!(parse_control("a 1"), None);
        assert_eq!(parse_control("hello"), None);
    }

    #[test]
    fn read_controls_stops_after_quit() {
        let (tx, mut rx) = mpsc::channel(8);
        let input = Cursor::new("a\nbogus\n\nr 1\nq\nr 2\n");
        read_controls(input, &tx);
        drop(tx);

        let mut got = Vec::new();
        while let Ok(c) = rx.try_recv() {
            got.push(c);
        }
        assert_eq!(
            got,
            vec![Control::RunAll, Control::RunNow(1), Control::Shutdown]
        );
    }

    #[test]
    fn render_prints_output_and_progress() {
        let cmds = vec![command(0, "echo ok"), command(1, "false")];
        let mut sink = ConsoleSink::new(&cmds);
        let mut out = Vec::new();

        sink.render(RunResult::pending(&cmds[0]), &mut out).unwrap();
        sink.render(
            RunResult::succeeded(&cmds[0], Duration::from_millis(3), "ok\n".into()),
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("⏳ echo ok running..."));
        assert!(text.contains("✅ echo ok finished in 3ms\nok\n"));
        assert!(text.ends_with("[1/2] 50% complete\n"));
        assert_eq!(sink.store().completed(), 1);
    }

    #[tokio::test]
    async fn run_drains_until_senders_drop() {
        let cmds = vec![command(0, "true")];
        let (tx, rx) = mpsc::channel(4);
        tx.send(RunResult::pending(&cmds[0])).await.unwrap();
        tx.send(RunResult::succeeded(&cmds[0], Duration::ZERO, String::new()))
            .await
            .unwrap();
        drop(tx);

        let store = ConsoleSink::new(&cmds).run(rx, std::io::sink()).await;
        let latest = store.get(0).unwrap();
        assert_eq!(latest.status, RunStatus::Succeeded);
        assert_eq!(latest.output, "No output");
    }
}
