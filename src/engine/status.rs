// src/engine/status.rs

use std::sync::Arc;

use crate::types::{Command, CommandId, RunResult, RunStatus};

/// Body shown for a command that has not run yet.
pub const WAITING_BODY: &str = "Waiting to run";

/// Latest known result per command, indexed by command id.
///
/// Owned and mutated only by the status sink. Every incoming result simply
/// overwrites the entry for its id, so whichever message arrives last wins,
/// including a late cancellation report from a superseded run.
#[derive(Debug, Clone)]
pub struct StatusStore {
    entries: Vec<RunResult>,
}

impl StatusStore {
    pub fn new(commands: &[Arc<Command>]) -> Self {
        let entries = commands
            .iter()
            .map(|c| {
                let mut r = RunResult::pending(c);
                r.output = WAITING_BODY.to_string();
                r
            })
            .collect();
        Self { entries }
    }

    /// Record `result`. Returns `false` for an id outside the store.
    pub fn apply(&mut self, result: RunResult) -> bool {
        match self.entries.get_mut(result.command_id) {
            Some(slot) => {
                *slot = result;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: CommandId) -> Option<&RunResult> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunResult> {
        self.entries.iter()
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Number of commands whose latest result is not `Pending`.
    pub fn completed(&self) -> usize {
        self.entries
            .iter()
            .filter(|r| r.status != RunStatus::Pending)
            .count()
    }

    /// `completed / total`, or 0 when there are no commands.
    pub fn progress(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.completed() as f64 / self.entries.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn commands(n: usize) -> Vec<Arc<Command>> {
        (0..n)
            .map(|i| Arc::new(Command::new(i, format!("cmd {i}"), vec![], vec![])))
            .collect()
    }

    #[test]
    fn starts_all_pending() {
        let store = StatusStore::new(&commands(3));
        assert_eq!(store.total(), 3);
        assert_eq!(store.completed(), 0);
        assert_eq!(store.get(1).map(|r| r.output.as_str()), Some(WAITING_BODY));
    }

    #[test]
    fn last_arrival_wins_per_id() {
        let cmds = commands(2);
        let mut store = StatusStore::new(&cmds);

        assert!(store.apply(RunResult::succeeded(&cmds[0], Duration::from_millis(5), "ok".into())));
        assert!(store.apply(RunResult::cancelled(&cmds[0], Duration::from_millis(1))));

        let latest = store.get(0).unwrap();
        assert!(latest.is_cancelled());
        assert_eq!(store.completed(), 1);
        assert!((store.progress() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn pending_result_counts_as_not_completed() {
        let cmds = commands(1);
        let mut store = StatusStore::new(&cmds);

        store.apply(RunResult::failed(&cmds[0], Duration::ZERO, "boom".into()));
        assert_eq!(store.completed(), 1);

        store.apply(RunResult::pending(&cmds[0]));
        assert_eq!(store.completed(), 0);
    }

    #[test]
    fn unknown_id_is_rejected() {
        let mut store = StatusStore::new(&commands(1));
        let stranger = Command::new(7, "x", vec![], vec![]);
        assert!(!store.apply(RunResult::pending(&stranger)));
    }

    #[test]
    fn empty_store_has_zero_progress() {
        let store = StatusStore::new(&[]);
        assert_eq!(store.progress(), 0.0);
    }
}
