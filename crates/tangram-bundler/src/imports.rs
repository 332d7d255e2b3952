/*
 * imports.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Import graph collection.
 */

//! Import graph collection.
//!
//! Starting from the root scene, every document reachable through `import`
//! fields is loaded exactly once and stored under its canonical location.
//! Loading is breadth-first in passes: each pass loads the imports of the
//! documents found by the previous pass that are not yet in the graph, and
//! collection stops when a pass finds nothing new. A location is inserted
//! at most once, so mutually importing scenes terminate.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tangram_scene::SceneValue;
use tracing::{debug, warn};

use crate::error::{BundleError, Result};
use crate::loader::SceneLoader;
use crate::paths::{is_remote, resolve_reference, scene_dir};

/// Key under which a scene lists the scenes it imports.
pub const IMPORT_KEY: &str = "import";

/// All scenes reachable from a root, keyed by canonical location.
///
/// Iteration order is discovery order, root first.
pub type ImportGraph = IndexMap<PathBuf, SceneValue>;

/// What to do with an import that points at a network location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteImportPolicy {
    /// Leave the import out of the graph and the merge, with a warning.
    #[default]
    Skip,
    /// Fail the run.
    Reject,
}

impl RemoteImportPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteImportPolicy::Skip => "skip",
            RemoteImportPolicy::Reject => "reject",
        }
    }
}

impl TryFrom<&str> for RemoteImportPolicy {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(RemoteImportPolicy::Skip),
            "reject" => Ok(RemoteImportPolicy::Reject),
            _ => Err(format!("Unknown remote import policy: {}", s)),
        }
    }
}

/// Raw entries of a scene's `import` field.
///
/// A missing or null field yields no entries, a string yields one entry and
/// a sequence yields its string items in order.
pub fn import_references(scene: &SceneValue) -> Vec<String> {
    match scene.get(IMPORT_KEY) {
        None => Vec::new(),
        Some(value @ SceneValue::Scalar(_)) => value
            .as_str()
            .map(|s| vec![s.to_string()])
            .unwrap_or_default(),
        Some(SceneValue::Sequence(items)) => items
            .iter()
            .filter_map(|item| {
                let entry = item.as_str();
                if entry.is_none() {
                    debug!("Ignoring non-string import entry: {:?}", item);
                }
                entry.map(str::to_string)
            })
            .collect(),
        Some(SceneValue::Map(_)) => {
            debug!("Ignoring mapping-valued import field");
            Vec::new()
        }
    }
}

/// Canonical locations imported by the scene at `location`.
///
/// Remote entries are dropped under [`RemoteImportPolicy::Skip`] and are an
/// error under [`RemoteImportPolicy::Reject`].
pub fn resolve_imports(
    scene: &SceneValue,
    location: &Path,
    policy: RemoteImportPolicy,
) -> Result<Vec<PathBuf>> {
    let dir = scene_dir(location);
    let mut resolved = Vec::new();

    for reference in import_references(scene) {
        if is_remote(&reference) {
            match policy {
                RemoteImportPolicy::Skip => {
                    warn!(
                        "Skipping remote import {} in {}",
                        reference,
                        location.display()
                    );
                    continue;
                }
                RemoteImportPolicy::Reject => {
                    return Err(BundleError::RemoteImport {
                        reference,
                        importer: location.to_path_buf(),
                    });
                }
            }
        }
        resolved.push(PathBuf::from(resolve_reference(dir, &reference)));
    }

    Ok(resolved)
}

/// Load every scene transitively imported by `root`.
///
/// `root_location` must be canonical (see [`crate::paths::scene_location`]).
/// The returned graph contains `root` itself under `root_location`.
///
/// # Errors
///
/// Fails on the first import that cannot be read or parsed. Nothing is
/// returned in that case.
pub fn collect_imports(
    root: SceneValue,
    root_location: &Path,
    loader: &dyn SceneLoader,
    policy: RemoteImportPolicy,
) -> Result<ImportGraph> {
    let mut graph = ImportGraph::new();
    graph.insert(root_location.to_path_buf(), root);

    let mut frontier = vec![root_location.to_path_buf()];
    let mut pass = 0;

    while !frontier.is_empty() {
        pass += 1;
        let mut next = Vec::new();

        for location in &frontier {
            let imports = match graph.get(location) {
                Some(scene) => resolve_imports(scene, location, policy)?,
                None => continue,
            };

            for import in imports {
                if graph.contains_key(&import) {
                    continue;
                }
                debug!("Loading import {} from {}", import.display(), location.display());
                let scene = loader.load(&import)?;
                graph.insert(import.clone(), scene);
                next.push(import);
            }
        }

        debug!("Import pass {} discovered {} new scene(s)", pass, next.len());
        frontier = next;
    }

    Ok(graph)
}
