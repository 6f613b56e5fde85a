// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Default name of the `--verbose` log file.
pub const DEFAULT_LOG_FILE: &str = "pan.log";

/// Command-line arguments for `panopticon`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "panopticon",
    version,
    about = "Watch paths and rerun shell commands whenever files change.",
    long_about = None
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    /// Path to the command file (YAML).
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Run every command once at startup.
    #[arg(short = 'r', long)]
    pub run_on_start: bool,

    /// Only watch commands whose text matches this glob.
    #[arg(short = 'm', long = "match", value_name = "GLOB", default_value = "*")]
    pub pattern: String,

    /// Write logs to the log file instead of stderr.
    #[arg(long)]
    pub verbose: bool,

    /// Log file used with `--verbose`.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PANOPTICON_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load the command file and print the resolved watch sets, then exit.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum CliCommand {
    /// Write a sample panopticon.yaml to the current directory.
    Init,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
