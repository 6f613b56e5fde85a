// tests/process_scenarios.rs
//
// End-to-end runs through real shells. Unix only.
#![cfg(unix)]

use panopticon_test_utils::{init_tracing, with_timeout, CommandBuilder, FakeObserverFactory};

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use panopticon::engine::{Orchestrator, OrchestratorOptions, StatusRx};
use panopticon::exec::ProcessExecutor;
use panopticon::types::{RunResult, RunStatus};
use panopticon::watch::{EventFilter, NotifyObserverFactory};
use tempfile::TempDir;
use tokio::sync::mpsc;

type TestResult = Result<(), Box<dyn Error>>;

fn start(
    dir: &Path,
    cmd: &str,
    observers: &dyn panopticon::watch::ObserverFactory,
    filter: EventFilter,
) -> (Orchestrator, StatusRx) {
    let (tx, rx) = mpsc::channel(64);
    let command = CommandBuilder::new(cmd).watch(dir).build();
    let orch = Orchestrator::new(
        vec![command],
        observers,
        Arc::new(ProcessExecutor::new(tx)),
        OrchestratorOptions {
            event_filter: filter,
            shutdown_grace: Duration::from_millis(20),
        },
    );
    (orch, rx)
}

/// Receive until `n` non-pending results have arrived.
async fn terminal_results(rx: &mut StatusRx, n: usize) -> Vec<RunResult> {
    let mut out = Vec::new();
    while out.len() < n {
        match with_timeout(rx.recv()).await {
            Some(r) if r.status != RunStatus::Pending => out.push(r),
            Some(_) => {}
            None => break,
        }
    }
    out
}

#[tokio::test]
async fn echo_reports_pending_then_success() -> TestResult {
    init_tracing();
    let tmp = TempDir::new()?;
    let factory = FakeObserverFactory::new();
    let (mut orch, mut rx) = start(tmp.path(), "echo ok", &factory, EventFilter::default());

    orch.run_now(0).await?;

    let first = with_timeout(rx.recv()).await.ok_or("no status")?;
    assert_eq!(first.status, RunStatus::Pending);
    let done = terminal_results(&mut rx, 1).await;
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].status, RunStatus::Succeeded);
    assert!(done[0].output.contains("ok"));

    orch.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_reports_failure() -> TestResult {
    init_tracing();
    let tmp = TempDir::new()?;
    let factory = FakeObserverFactory::new();
    let (mut orch, mut rx) = start(tmp.path(), "exit 1", &factory, EventFilter::default());

    orch.run_now(0).await?;

    let done = terminal_results(&mut rx, 1).await;
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].status, RunStatus::Failed);
    assert!(!done[0].is_cancelled());

    orch.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn newer_run_supersedes_older_one() -> TestResult {
    init_tracing();
    let tmp = TempDir::new()?;
    let factory = FakeObserverFactory::new();
    let (mut orch, mut rx) = start(
        tmp.path(),
        "sleep 1; echo done",
        &factory,
        EventFilter::default(),
    );

    orch.run_now(0).await?;
    tokio::time::sleep(Duration::from_millis(150)).await;
    orch.run_now(0).await?;

    let done = terminal_results(&mut rx, 2).await;
    assert_eq!(done.len(), 2);
    assert_eq!(done.iter().filter(|r| r.is_cancelled()).count(), 1);
    let finished: Vec<_> = done
        .iter()
        .filter(|r| r.status == RunStatus::Succeeded)
        .collect();
    assert_eq!(finished.len(), 1);
    assert!(finished[0].output.contains("done"));

    orch.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn shutdown_reports_cancellation_for_running_command() -> TestResult {
    init_tracing();
    let tmp = TempDir::new()?;
    let factory = FakeObserverFactory::new();
    let (mut orch, mut rx) = start(tmp.path(), "sleep 30", &factory, EventFilter::default());

    orch.run_now(0).await?;
    let first = with_timeout(rx.recv()).await.ok_or("no status")?;
    assert_eq!(first.status, RunStatus::Pending);

    with_timeout(orch.shutdown()).await;

    let done = terminal_results(&mut rx, 1).await;
    assert_eq!(done.len(), 1);
    assert!(done[0].is_cancelled());
    Ok(())
}

#[cfg(target_os = "linux")]
fn is_gone(pid: u32) -> bool {
    match fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => true,
        // Field 3 is the state; a zombie no longer runs anything.
        Ok(stat) => stat
            .rsplit(')')
            .next()
            .and_then(|rest| rest.split_whitespace().next())
            == Some("Z"),
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn cancellation_kills_background_children() -> TestResult {
    init_tracing();
    let tmp = TempDir::new()?;
    let pidfile = tmp.path().join("child.pid");
    let cmd = format!("sleep 30 & echo $! > '{}'; wait", pidfile.display());
    let factory = FakeObserverFactory::new();
    let (mut orch, mut rx) = start(tmp.path(), &cmd, &factory, EventFilter::default());

    orch.run_now(0).await?;

    let pid = read_pid(&pidfile).await;
    assert!(!is_gone(pid));

    orch.shutdown().await;
    let done = terminal_results(&mut rx, 1).await;
    assert!(done[0].is_cancelled());

    wait_until_gone(pid).await;
    Ok(())
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn cancellation_kills_children_of_an_exited_shell() -> TestResult {
    init_tracing();
    let tmp = TempDir::new()?;
    let pidfile = tmp.path().join("child.pid");
    // No `wait`: the shell exits at once while `sleep` keeps stdout open.
    let cmd = format!("sleep 30 & echo $! > '{}'", pidfile.display());
    let factory = FakeObserverFactory::new();
    let (mut orch, mut rx) = start(tmp.path(), &cmd, &factory, EventFilter::default());

    orch.run_now(0).await?;
    let pid = read_pid(&pidfile).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Still waiting on the pipe, so nothing terminal yet.
    let mut pending_only = true;
    while let Ok(r) = rx.try_recv() {
        pending_only &= r.status == RunStatus::Pending;
    }
    assert!(pending_only);
    assert!(!is_gone(pid));

    orch.shutdown().await;
    let done = terminal_results(&mut rx, 1).await;
    assert!(done[0].is_cancelled());

    wait_until_gone(pid).await;
    Ok(())
}

#[cfg(target_os = "linux")]
async fn read_pid(pidfile: &Path) -> u32 {
    with_timeout(async {
        loop {
            if let Ok(text) = fs::read_to_string(pidfile) {
                if let Ok(pid) = text.trim().parse() {
                    break pid;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}

#[cfg(target_os = "linux")]
async fn wait_until_gone(pid: u32) {
    with_timeout(async {
        while !is_gone(pid) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
}

/// Collect terminal results until none has arrived for `quiet`.
async fn settled_results(rx: &mut StatusRx, quiet: Duration) -> Vec<RunResult> {
    let mut out = Vec::new();
    while let Ok(Some(r)) = tokio::time::timeout(quiet, rx.recv()).await {
        if r.status != RunStatus::Pending {
            out.push(r);
        }
    }
    out
}

/// One new file under `<tmp>/data` with `cmd` watching that directory.
async fn single_write_results(cmd: &str) -> Result<Vec<RunResult>, Box<dyn Error>> {
    let tmp = TempDir::new()?;
    let data = tmp.path().join("data");
    fs::create_dir(&data)?;
    let (mut orch, mut rx) = start(&data, cmd, &NotifyObserverFactory, EventFilter::default());
    tokio::time::sleep(Duration::from_millis(200)).await;

    fs::write(data.join("input.txt"), "hello\n")?;
    let results = settled_results(&mut rx, Duration::from_secs(2)).await;

    orch.shutdown().await;
    Ok(results)
}

#[tokio::test]
async fn one_write_yields_exactly_one_success() -> TestResult {
    init_tracing();
    let results = single_write_results("echo ok").await?;

    assert_eq!(results.len(), 1, "results: {results:?}");
    assert_eq!(results[0].status, RunStatus::Succeeded);
    assert!(results[0].output.contains("ok"));
    Ok(())
}

#[tokio::test]
async fn one_write_to_a_failing_command_yields_exactly_one_failure() -> TestResult {
    init_tracing();
    let results = single_write_results("exit 1").await?;

    assert_eq!(results.len(), 1, "results: {results:?}");
    assert_eq!(results[0].status, RunStatus::Failed);
    assert!(!results[0].is_cancelled());
    Ok(())
}

#[tokio::test]
async fn real_file_write_triggers_command() -> TestResult {
    init_tracing();
    let tmp = TempDir::new()?;
    let (mut orch, mut rx) = start(
        tmp.path(),
        "echo changed",
        &NotifyObserverFactory,
        EventFilter::new(["pan.log"]),
    );
    tokio::time::sleep(Duration::from_millis(200)).await;

    // The log file never triggers a run.
    fs::write(tmp.path().join("pan.log"), "log line\n")?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(rx.try_recv().is_err());

    fs::write(tmp.path().join("input.txt"), "hello\n")?;

    // A burst of write events may cancel early runs; the last one succeeds.
    let success = with_timeout(async {
        loop {
            match rx.recv().await {
                Some(r) if r.status == RunStatus::Succeeded => break Some(r),
                Some(_) => {}
                None => break None,
            }
        }
    })
    .await
    .ok_or("status channel closed")?;
    assert!(success.output.contains("changed"));

    orch.shutdown().await;
    Ok(())
}
