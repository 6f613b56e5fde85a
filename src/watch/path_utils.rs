// src/watch/path_utils.rs

//! Lexical path helpers used when resolving watch sets.
//!
//! Nothing here touches the filesystem except [`absolutize_from_cwd`], which
//! reads the current working directory. Comparisons are done on path
//! components, never on raw strings, so `/foo2` is not inside `/foo`.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Lexically normalise a path: drop `.` segments and fold `..` into the
/// preceding normal segment where one exists.
///
/// `..` directly under the root is dropped (`/..` is `/`). Leading `..`
/// segments of a relative path are kept.
pub fn clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Make `path` absolute relative to `cwd` and clean it.
///
/// An already-absolute path is cleaned but not re-rooted.
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        clean(path)
    } else {
        clean(&cwd.join(path))
    }
}

/// [`absolutize`] against the process's current working directory.
pub fn absolutize_from_cwd(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(clean(path));
    }
    let cwd = std::env::current_dir()?;
    Ok(absolutize(path, &cwd))
}

/// Relative path that leads from `base` to `target`, using `..` segments
/// where `target` is not below `base`.
///
/// Both inputs are cleaned first. Returns `None` when the two paths cannot be
/// related lexically (different roots, drive prefixes, or one absolute and
/// one relative).
pub fn relative_path(base: &Path, target: &Path) -> Option<PathBuf> {
    let base = clean(base);
    let target = clean(target);

    if base.is_absolute() != target.is_absolute() {
        return None;
    }

    let base_comps: Vec<Component<'_>> = base.components().collect();
    let target_comps: Vec<Component<'_>> = target.components().collect();

    let common = base_comps
        .iter()
        .zip(target_comps.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // Diverging before the first normal segment means different roots or
    // drive prefixes.
    let anchored = |c: &Component<'_>| matches!(c, Component::Prefix(_) | Component::RootDir);
    if base_comps[..common].iter().filter(|c| anchored(c)).count()
        != base_comps.iter().filter(|c| anchored(c)).count()
    {
        return None;
    }

    let mut rel = PathBuf::new();
    for comp in &base_comps[common..] {
        if matches!(comp, Component::CurDir) {
            continue;
        }
        rel.push("..");
    }
    for comp in &target_comps[common..] {
        rel.push(comp.as_os_str());
    }

    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Some(rel)
}

/// True if `candidate` equals `ancestor` or lies anywhere below it.
///
/// Computed from the relative path `ancestor -> candidate`: the candidate is
/// inside iff that path neither is nor starts with a `..` segment.
pub fn is_same_or_descendant(ancestor: &Path, candidate: &Path) -> bool {
    match relative_path(ancestor, candidate) {
        Some(rel) => !matches!(rel.components().next(), Some(Component::ParentDir)),
        None => false,
    }
}
