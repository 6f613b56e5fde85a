// src/config/mod.rs

//! Configuration loading and validation for panopticon.
//!
//! Responsibilities:
//! - Define the YAML-backed data model (`model.rs`).
//! - Load a command file from disk and resolve its paths (`loader.rs`).
//! - Validate basic invariants like non-empty commands (`validate.rs`).
//! - Select commands by a glob over their text and number them (`filter.rs`).
//! - Write a starter file for `panopticon init` (`init.rs`).

pub mod filter;
pub mod init;
pub mod loader;
pub mod model;
pub mod validate;

pub use filter::CommandFilter;
pub use init::{init_config, SAMPLE_CONFIG};
pub use loader::{load_and_validate, load_from_path, resolve_specs, DEFAULT_CONFIG_FILE};
pub use model::{CommandConfig, CommandSpec, ConfigFile};
pub use validate::validate_config;
