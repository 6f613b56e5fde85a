// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only configuration problems are fatal. Everything that can go wrong while
//! watching or running commands is logged and surfaced as a per-command
//! status instead of being propagated out of the orchestrator.

use thiserror::Error;

use crate::types::CommandId;

#[derive(Error, Debug)]
pub enum PanopticonError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid match pattern: {0}")]
    PatternError(#[from] globset::Error),

    #[error("File watcher error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("Unknown command id: {0}")]
    UnknownCommand(CommandId),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PanopticonError>;
