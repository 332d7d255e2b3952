/*
 * paths.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Path resolution helpers shared by import collection, merging and
 * dependency discovery.
 */

//! Path helpers.
//!
//! All resolution here is lexical: nothing touches the filesystem, so the
//! same scene produces the same locations whether or not the referenced
//! files exist. Existence checks go through [`crate::SceneLoader::is_file`].

use std::path::{Component, Path, PathBuf};

/// Whether a reference points somewhere other than the local filesystem.
///
/// Any `scheme://` prefix counts, as do protocol-relative `//` references
/// and `data:` URIs. Schemes match case-insensitively.
pub fn is_remote(reference: &str) -> bool {
    if reference.starts_with("//") {
        return true;
    }
    if reference
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
    {
        return true;
    }
    match reference.find("://") {
        Some(end) => is_scheme(&reference[..end]),
        None => false,
    }
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Whether a base-relative name escapes the base directory.
///
/// Such names cannot be stored in an archive: they would extract outside
/// the target directory.
pub fn is_parent_relative(name: &str) -> bool {
    let path = Path::new(name);
    path.is_absolute() || matches!(path.components().next(), Some(Component::ParentDir))
}

/// Lexically normalize a path.
///
/// Removes `.` components and folds `..` into a preceding normal component.
/// Leading `..` components of a relative path are kept; `..` directly under
/// the root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Canonical location of a scene file: absolute and normalized.
///
/// This is the key under which a scene appears in the import graph.
pub fn scene_location(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    normalize(&absolute)
}

/// Directory that relative references inside the scene at `location` are
/// resolved against.
pub fn scene_dir(location: &Path) -> &Path {
    location.parent().unwrap_or(Path::new("."))
}

/// Resolve `reference` against `dir`.
///
/// Remote and absolute references are returned unchanged.
pub fn resolve_reference(dir: &Path, reference: &str) -> String {
    if is_remote(reference) || Path::new(reference).is_absolute() {
        return reference.to_string();
    }
    path_to_string(&normalize(&dir.join(reference)))
}

/// Express `path` relative to `base`, lexically.
///
/// Both paths are normalized first. The result may start with `..` when
/// `path` is not below `base`. A relative `path` is taken as already
/// relative to `base`.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path = normalize(path);
    if !path.is_absolute() {
        return path;
    }
    let base = normalize(base);

    let path_parts: Vec<_> = path.components().collect();
    let base_parts: Vec<_> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base_parts.len() {
        result.push("..");
    }
    for part in &path_parts[common..] {
        result.push(part.as_os_str());
    }

    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}

/// Name for an archive entry: forward slashes regardless of platform.
pub fn archive_name(path: &Path) -> String {
    path_to_string(path).replace('\\', "/")
}

pub(crate) fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
