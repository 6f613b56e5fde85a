// src/config/init.rs

use std::fs;
use std::path::Path;

use tracing::info;

use crate::errors::Result;

/// Sample written by `panopticon init`.
pub const SAMPLE_CONFIG: &str = r#"commands:
  - cmd: "echo 'Hello, World!'"
    watch_paths:
      - ./
    ignore_paths:
      - ./target
"#;

/// Write [`SAMPLE_CONFIG`] to `path` unless a file already exists there.
///
/// Returns whether a file was written.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        info!(path = ?path, "config already exists; leaving it untouched");
        return Ok(false);
    }

    info!(path = ?path, "creating sample config");
    fs::write(path, SAMPLE_CONFIG)?;
    Ok(true)
}
