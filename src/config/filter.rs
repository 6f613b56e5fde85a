// src/config/filter.rs

//! `--match` filtering of commands by their text.

use globset::{Glob, GlobMatcher};

use crate::config::model::CommandSpec;
use crate::errors::Result;
use crate::types::Command;

/// Glob over command text deciding which commands get a session at all.
///
/// `*` matches any run of characters, including `/`.
#[derive(Debug, Clone)]
pub struct CommandFilter {
    pattern: String,
    matcher: GlobMatcher,
}

impl CommandFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let matcher = Glob::new(pattern)?.compile_matcher();
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, cmd: &str) -> bool {
        self.matcher.is_match(cmd)
    }

    /// Keep matching specs and number them densely in their original order.
    pub fn select(&self, specs: Vec<CommandSpec>) -> Vec<Command> {
        specs
            .into_iter()
            .filter(|spec| self.matches(&spec.cmd))
            .enumerate()
            .map(|(id, spec)| spec.into_command(id))
            .collect()
    }
}
