// src/watch/resolver.rs

//! Expansion of a command's `watch_paths` / `ignore_paths` into the concrete
//! set of directories registered with the file observer.
//!
//! Only directories are registered; a directory watch already reports writes
//! to the files directly inside it. The set is computed once when a session
//! starts and is not refreshed when the tree changes afterwards.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::watch::path_utils::{absolutize_from_cwd, is_same_or_descendant};

/// Absolute, deduplicated set of directories to observe for one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedWatchSet {
    dirs: BTreeSet<PathBuf>,
}

impl ResolvedWatchSet {
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.dirs.iter()
    }
}

impl IntoIterator for ResolvedWatchSet {
    type Item = PathBuf;
    type IntoIter = std::collections::btree_set::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.dirs.into_iter()
    }
}

/// Resolve watch and ignore declarations into a [`ResolvedWatchSet`].
///
/// - Every input path is made absolute against the current working directory
///   and lexically cleaned.
/// - Each watch path contributes itself plus every directory below it.
/// - Any directory equal to, or below, an ignore path is dropped. Ignored
///   subtrees are not descended into.
/// - Paths that do not exist or cannot be read are skipped; one bad entry
///   never prevents the rest of the set from being built.
pub fn resolve<P, Q>(watch_paths: &[P], ignore_paths: &[Q]) -> ResolvedWatchSet
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let ignores: Vec<PathBuf> = ignore_paths
        .iter()
        .filter_map(|p| absolute_or_skip(p.as_ref()))
        .collect();

    let mut dirs = BTreeSet::new();

    for watch in watch_paths {
        let Some(root) = absolute_or_skip(watch.as_ref()) else {
            continue;
        };

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !is_ignored(entry.path(), &ignores));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => {
                    dirs.insert(entry.into_path());
                }
                Ok(entry) if entry.depth() == 0 => {
                    warn!(
                        path = ?entry.path(),
                        "watch path is not a directory and will never trigger; watch its parent instead"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(root = ?root, error = %err, "skipping unreadable watch entry");
                }
            }
        }
    }

    debug!(
        watch = watch_paths.len(),
        ignore = ignores.len(),
        resolved = dirs.len(),
        "resolved watch set"
    );

    ResolvedWatchSet { dirs }
}

/// True if `dir` equals one of `ignores` or is nested under one.
pub fn is_ignored(dir: &Path, ignores: &[PathBuf]) -> bool {
    ignores
        .iter()
        .any(|ignore| is_same_or_descendant(ignore, dir))
}

fn absolute_or_skip(path: &Path) -> Option<PathBuf> {
    match absolutize_from_cwd(path) {
        Ok(abs) => Some(abs),
        Err(err) => {
            warn!(path = ?path, error = %err, "could not make path absolute; skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn resolves_every_nested_directory() -> TestResult {
        let tmp = tempdir()?;
        let root = tmp.path().join("root");
        fs::create_dir_all(root.join("x/y/z"))?;
        fs::write(root.join("x/file.txt"), "content")?;

        let set = resolve(&[&root], &[] as &[PathBuf]);

        assert_eq!(set.len(), 4);
        assert!(set.contains(&root));
        assert!(set.contains(&root.join("x")));
        assert!(set.contains(&root.join("x/y")));
        assert!(set.contains(&root.join("x/y/z")));
        assert!(!set.contains(&root.join("x/file.txt")));
        Ok(())
    }

    #[test]
    fn ignore_removes_directory_and_its_subtree() -> TestResult {
        let tmp = tempdir()?;
        let root = tmp.path().to_path_buf();
        fs::create_dir_all(root.join("sub/deeper"))?;

        let set = resolve(&[&root], &[root.join("sub")]);

        assert!(set.contains(&root));
        assert!(!set.contains(&root.join("sub")));
        assert!(!set.contains(&root.join("sub/deeper")));
        assert_eq!(set.len(), 1);
        Ok(())
    }

    #[test]
    fn ignore_does_not_catch_string_prefix_siblings() -> TestResult {
        let tmp = tempdir()?;
        let root = tmp.path().to_path_buf();
        fs::create_dir_all(root.join("b"))?;
        fs::create_dir_all(root.join("bc"))?;

        let set = resolve(&[&root], &[root.join("b")]);

        assert!(!set.contains(&root.join("b")));
        assert!(set.contains(&root.join("bc")));
        Ok(())
    }

    #[test]
    fn missing_paths_are_skipped_without_losing_the_rest() -> TestResult {
        let tmp = tempdir()?;
        let good = tmp.path().join("good");
        fs::create_dir_all(&good)?;

        let set = resolve(&[tmp.path().join("missing"), good.clone()], &[] as &[PathBuf]);

        assert_eq!(set.iter().collect::<Vec<_>>(), vec![&good]);
        Ok(())
    }

    #[test]
    fn overlapping_watch_paths_are_deduplicated() -> TestResult {
        let tmp = tempdir()?;
        let root = tmp.path().to_path_buf();
        fs::create_dir_all(root.join("a/b"))?;

        let set = resolve(&[root.clone(), root.join("a"), root.join("a/./b/..")], &[] as &[PathBuf]);

        assert_eq!(set.len(), 3);
        Ok(())
    }

    #[test]
    fn ignoring_the_watch_root_yields_nothing() -> TestResult {
        let tmp = tempdir()?;
        fs::create_dir_all(tmp.path().join("x"))?;

        let set = resolve(&[tmp.path()], &[tmp.path()]);

        assert!(set.is_empty());
        Ok(())
    }

    #[test]
    fn file_watch_path_contributes_no_directory() -> TestResult {
        let tmp = tempdir()?;
        let manifest = tmp.path().join("Cargo.toml");
        fs::write(&manifest, "[package]\n")?;
        let src = tmp.path().join("src");
        fs::create_dir(&src)?;

        let set = resolve(&[manifest.clone(), src.clone()], &[] as &[PathBuf]);

        assert!(!set.contains(&manifest));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![&src]);
        Ok(())
    }
}
