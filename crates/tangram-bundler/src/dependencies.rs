/*
 * dependencies.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Asset dependency discovery over a merged scene.
 */

//! Dependency collection.
//!
//! Walks a merged scene, records every asset file it references and
//! rewrites those references to be relative to the bundle's base path, so
//! the scene and its assets can be stored side by side in an archive.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tangram_scene::SceneValue;
use tracing::{debug, warn};

use crate::loader::SceneLoader;
use crate::paths::{archive_name, is_parent_relative, is_remote, relative_to, resolve_reference};
use crate::rules::{AssetKind, AssetSite, texture_urls, visit_asset_fields};

/// Whether a referenced asset can be bundled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    /// Exists on the local filesystem
    Local,
    /// Local path that does not exist; left out of the archive
    Missing,
    /// Network reference; left out of the archive
    Remote,
    /// Exists, but outside the base path; left out of the archive
    Outside,
}

/// An asset referenced by a scene field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    /// Dotted field name holding the reference, e.g. `textures.grid.url`
    pub field: String,
    pub kind: AssetKind,
    /// Path relative to the base path, or the remote reference unchanged
    pub path: String,
    pub status: AssetStatus,
}

impl AssetReference {
    pub fn is_bundled(&self) -> bool {
        self.status == AssetStatus::Local
    }
}

/// Collect the asset references of `root` into `file_list`.
///
/// References are rewritten in place to be relative to `base_path`. A
/// texture slot naming an entry of the `textures` map keeps the name, and
/// its reference records the texture's file instead.
pub fn fetch_dependencies(
    file_list: &mut Vec<AssetReference>,
    root: &mut SceneValue,
    base_path: &Path,
    loader: &dyn SceneLoader,
) {
    let textures: HashMap<String, String> = texture_urls(root).into_iter().collect();
    let start = file_list.len();

    visit_asset_fields(root, |site| {
        if let Some(reference) = locate(site, &textures, base_path, loader) {
            debug!(
                "{} {} -> {} ({:?})",
                reference.kind.as_str(),
                reference.field,
                reference.path,
                reference.status
            );
            file_list.push(reference);
        }
    });

    debug!(
        "Found {} asset reference(s) relative to {}",
        file_list.len() - start,
        base_path.display()
    );
}

fn locate(
    mut site: AssetSite<'_>,
    textures: &HashMap<String, String>,
    base_path: &Path,
    loader: &dyn SceneLoader,
) -> Option<AssetReference> {
    let reference = site.reference().to_string();
    let field = site.field.clone();
    let kind = site.kind;

    if is_remote(&reference) {
        return Some(AssetReference {
            field,
            kind,
            path: reference,
            status: AssetStatus::Remote,
        });
    }

    let (relative, exists) = localize(&reference, base_path, loader);

    if !kind.is_texture_slot() || exists {
        site.set_reference(relative.clone());
        return Some(AssetReference {
            field,
            kind,
            status: status_for(&relative, exists),
            path: relative,
        });
    }

    // A texture slot that is not a file may name a texture
    if let Some(url) = textures.get(&reference) {
        if is_remote(url) {
            return Some(AssetReference {
                field,
                kind,
                path: url.clone(),
                status: AssetStatus::Remote,
            });
        }
        let (path, exists) = localize(url, base_path, loader);
        return Some(AssetReference {
            field,
            kind,
            status: status_for(&path, exists),
            path,
        });
    }

    if kind.reports_unresolved() {
        site.set_reference(relative.clone());
        return Some(AssetReference {
            field,
            kind,
            path: relative,
            status: AssetStatus::Missing,
        });
    }

    None
}

/// Base-relative form of a local reference, and whether the file exists.
fn localize(reference: &str, base_path: &Path, loader: &dyn SceneLoader) -> (String, bool) {
    let absolute = PathBuf::from(resolve_reference(base_path, reference));
    let exists = loader.is_file(&absolute);
    let relative = relative_to(&absolute, base_path);
    (archive_name(&relative), exists)
}

fn status_for(path: &str, exists: bool) -> AssetStatus {
    if !exists {
        AssetStatus::Missing
    } else if is_parent_relative(path) {
        warn!("Not bundling {}: it is outside the scene directory", path);
        AssetStatus::Outside
    } else {
        AssetStatus::Local
    }
}

/// Deduplicated list of base-relative paths to bundle, in discovery order.
///
/// Only names that stay inside the base path are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    paths: IndexSet<String>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset reference. Only local references are added.
    pub fn insert_asset(&mut self, reference: &AssetReference) -> bool {
        if !reference.is_bundled() {
            return false;
        }
        self.paths.insert(reference.path.clone())
    }

    /// Add a scene source file at an absolute `location`.
    ///
    /// Returns `false`, adding nothing, for a source outside `base_path`.
    pub fn insert_source(&mut self, location: &Path, base_path: &Path) -> bool {
        let name = archive_name(&relative_to(location, base_path));
        if is_parent_relative(&name) {
            return false;
        }
        self.paths.insert(name)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

impl<'a> Extend<&'a AssetReference> for DependencySet {
    fn extend<I: IntoIterator<Item = &'a AssetReference>>(&mut self, iter: I) {
        for reference in iter {
            self.insert_asset(reference);
        }
    }
}
