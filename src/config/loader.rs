// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::config::model::{CommandSpec, ConfigFile};
use crate::config::validate::validate_config;
use crate::errors::{PanopticonError, Result};

/// Default command file, looked up in the current working directory.
pub const DEFAULT_CONFIG_FILE: &str = "panopticon.yaml";

/// Load a command file from a given path and return the raw `ConfigFile`.
///
/// This only performs YAML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PanopticonError::ConfigError(format!(
            "config file {path:?} not found; run `panopticon init` or create one"
        )));
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: ConfigFile = serde_yaml::from_str(&contents)?;
    Ok(config)
}

/// Load, validate and resolve a command file.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads YAML.
/// - Checks command text and watch paths are present.
/// - Makes every watch/ignore path absolute against the current working
///   directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Vec<CommandSpec>> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;

    let cwd = std::env::current_dir().context("reading current working directory")?;
    Ok(resolve_specs(&config, &cwd))
}

/// Turn a validated config into [`CommandSpec`]s relative to `cwd`.
pub fn resolve_specs(config: &ConfigFile, cwd: &Path) -> Vec<CommandSpec> {
    config
        .commands
        .iter()
        .map(|raw| CommandSpec::from_config(raw, cwd))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parses_commands_in_order() -> TestResult {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"
commands:
  - cmd: "echo 'hello world'"
    watch_paths: ["./src"]
    ignore_paths: ["./src/gen"]
  - cmd: echo test
    watch_paths: [./panopticon]
theme: "default"
"#
        )?;

        let cfg = load_from_path(file.path())?;

        assert_eq!(cfg.commands.len(), 2);
        assert_eq!(cfg.commands[0].cmd, "echo 'hello world'");
        assert_eq!(cfg.commands[0].ignore_paths, vec!["./src/gen".to_string()]);
        assert!(cfg.commands[1].ignore_paths.is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn specs_have_absolute_clean_paths() -> TestResult {
        let cfg: ConfigFile = serde_yaml::from_str(
            "commands:\n  - cmd: ls\n    watch_paths: [./data, /abs/./x]\n    ignore_paths: [data/../tmp]\n",
        )?;

        let specs = resolve_specs(&cfg, Path::new("/work"));

        assert_eq!(
            specs[0].watch_paths,
            vec![PathBuf::from("/work/data"), PathBuf::from("/abs/x")]
        );
        assert_eq!(specs[0].ignore_paths, vec![PathBuf::from("/work/tmp")]);
        Ok(())
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load_from_path("definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, PanopticonError::ConfigError(_)));
        assert!(err.to_string().contains("panopticon init"));
    }

    #[test]
    fn malformed_yaml_is_reported() -> TestResult {
        let mut file = NamedTempFile::new()?;
        write!(file, "commands:\n  - cmd: [unterminated\n")?;

        let err = load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, PanopticonError::YamlError(_)));
        Ok(())
    }

    #[test]
    fn command_without_watch_paths_fails_validation() -> TestResult {
        let mut file = NamedTempFile::new()?;
        write!(file, "commands:\n  - cmd: echo hi\n")?;

        let err = load_and_validate(file.path()).unwrap_err();
        assert!(matches!(err, PanopticonError::ConfigError(_)));
        Ok(())
    }
}
