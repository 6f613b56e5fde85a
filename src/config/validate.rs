// src/config/validate.rs

use crate::config::model::ConfigFile;
use crate::errors::{PanopticonError, Result};

/// Run semantic validation against a parsed command file.
///
/// This checks:
/// - there is at least one command
/// - every `cmd` is non-blank
/// - every command declares at least one watch path, none of them blank
///
/// It does not check that paths exist; missing directories are skipped when
/// the watch set is resolved.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_commands(cfg)?;
    validate_commands(cfg)?;
    Ok(())
}

fn ensure_has_commands(cfg: &ConfigFile) -> Result<()> {
    if cfg.commands.is_empty() {
        return Err(PanopticonError::ConfigError(
            "config must contain at least one entry under `commands`".to_string(),
        ));
    }
    Ok(())
}

fn validate_commands(cfg: &ConfigFile) -> Result<()> {
    for (index, command) in cfg.commands.iter().enumerate() {
        if command.cmd.trim().is_empty() {
            return Err(PanopticonError::ConfigError(format!(
                "command #{index} has an empty `cmd`"
            )));
        }
        if command.watch_paths.is_empty() {
            return Err(PanopticonError::ConfigError(format!(
                "command '{}' must declare at least one entry in `watch_paths`",
                command.cmd
            )));
        }
        let blank = |p: &String| p.trim().is_empty();
        if command.watch_paths.iter().any(blank) || command.ignore_paths.iter().any(blank) {
            return Err(PanopticonError::ConfigError(format!(
                "command '{}' has a blank path entry",
                command.cmd
            )));
        }
    }
    Ok(())
}
