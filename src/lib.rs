// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;
pub mod watch;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, CliCommand};
use crate::config::{init_config, load_and_validate, CommandFilter};
use crate::engine::{
    spawn_stdin_reader, ConsoleSink, Control, Orchestrator, OrchestratorOptions,
};
use crate::exec::ProcessExecutor;
use crate::types::Command;
use crate::watch::{resolve, EventFilter, NotifyObserverFactory};

/// Capacity of the executor -> sink status channel.
const STATUS_CAPACITY: usize = 256;

/// How long the sink may take to drain after shutdown.
const SINK_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and the `--match` filter
/// - one watch session per command under the orchestrator
/// - the process executor
/// - the console sink and keyboard control
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    if let Some(CliCommand::Init) = args.command {
        if init_config(&args.config)? {
            println!("wrote {}", args.config.display());
        } else {
            println!("{} already exists; left untouched", args.config.display());
        }
        return Ok(());
    }

    let specs = load_and_validate(&args.config)?;
    let filter = CommandFilter::new(&args.pattern)?;
    let commands = filter.select(specs);
    if commands.is_empty() {
        bail!("no commands match pattern `{}`", filter.pattern());
    }

    if args.dry_run {
        print_dry_run(&commands);
        return Ok(());
    }

    let (status_tx, status_rx) = mpsc::channel(STATUS_CAPACITY);
    let executor = Arc::new(ProcessExecutor::new(status_tx));

    let options = OrchestratorOptions {
        event_filter: EventFilter::new(excluded_names(&args.log_file)),
        ..OrchestratorOptions::default()
    };
    let mut orchestrator = Orchestrator::new(commands, &NotifyObserverFactory, executor, options);

    let sink = ConsoleSink::new(orchestrator.commands());
    if let Err(err) = sink.print_banner(&mut std::io::stdout()) {
        warn!(error = %err, "failed to print command list");
    }
    let sink_task = tokio::spawn(sink.run(status_rx, std::io::stdout()));

    let (control_tx, mut control_rx) = mpsc::channel::<Control>(16);
    spawn_stdin_reader(control_tx.clone());

    // Ctrl-C → graceful shutdown.
    {
        let tx = control_tx;
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(Control::Shutdown).await;
        });
    }

    if args.run_on_start {
        info!("running all commands at startup");
        orchestrator.run_all().await;
    }

    while let Some(control) = control_rx.recv().await {
        debug!(?control, "control message");
        match control {
            Control::RunNow(id) => {
                if let Err(err) = orchestrator.run_now(id).await {
                    warn!(error = %err, "ignoring run request");
                }
            }
            Control::RunAll => orchestrator.run_all().await,
            Control::Shutdown => break,
        }
    }

    orchestrator.shutdown().await;
    // Dropping the orchestrator releases the executor and with it the last
    // status sender, which lets the sink finish.
    drop(orchestrator);
    if tokio::time::timeout(SINK_DRAIN_TIMEOUT, sink_task).await.is_err() {
        debug!("status sink still draining at exit");
    }

    Ok(())
}

/// File names whose writes never trigger a run.
fn excluded_names(log_file: &Path) -> Vec<String> {
    log_file
        .file_name()
        .map(|name| vec![name.to_string_lossy().into_owned()])
        .unwrap_or_default()
}

/// Print each command with the directories it would watch.
fn print_dry_run(commands: &[Command]) {
    println!("panopticon dry-run");
    println!();

    println!("commands ({}):", commands.len());
    for command in commands {
        println!("  [{}] {}", command.id, command.cmd);
        let resolved = resolve(&command.watch_paths, &command.ignore_paths);
        if resolved.is_empty() {
            println!("      (no directories to watch)");
        }
        for dir in resolved.iter() {
            println!("      watch: {}", dir.display());
        }
        for ignored in &command.ignore_paths {
            println!("      ignore: {}", ignored.display());
        }
    }

    debug!("dry-run complete (no execution)");
}
