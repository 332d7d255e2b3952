/*
 * bundle.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Bundle planning and writing.
 */

//! End-to-end bundling of a root scene.
//!
//! Bundling runs in two phases. [`plan_bundle`] loads the import graph,
//! merges it, discovers assets and decides the archive contents without
//! touching the output directory. [`write_bundle`] then writes the archive.
//! A failure while planning therefore never leaves a partial archive.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tangram_scene::SceneValue;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::archive::{ArchiveEntry, write_archive};
use crate::dependencies::{AssetReference, AssetStatus, DependencySet, fetch_dependencies};
use crate::error::{BundleError, Result};
use crate::imports::{RemoteImportPolicy, collect_imports};
use crate::loader::{FsLoader, SceneLoader};
use crate::merge::merge_scene;
use crate::paths::{
    archive_name, is_parent_relative, normalize, relative_to, scene_dir, scene_location,
};

/// Directory next to the root scene holding theme scenes.
pub const THEMES_DIR: &str = "themes";

/// Extension of the written archive.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Whether `path` has a scene file extension (`.yaml` or `.yml`).
pub fn is_scene_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// How a bundle is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOptions {
    /// Store the merged scene instead of the on-disk import sources
    pub unified: bool,
    /// Directory the archive is written to
    pub output_dir: PathBuf,
    pub remote_imports: RemoteImportPolicy,
    /// Also bundle `themes/*.yaml` next to the root scene
    pub include_themes: bool,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            unified: false,
            output_dir: PathBuf::from("."),
            remote_imports: RemoteImportPolicy::default(),
            include_themes: true,
        }
    }
}

/// Everything needed to write a bundle.
#[derive(Debug, Clone)]
pub struct BundlePlan {
    /// Canonical location of the root scene
    pub root_location: PathBuf,
    /// Directory archive names are relative to
    pub base_path: PathBuf,
    /// The root scene with its imports merged and asset paths base-relative
    pub merged: SceneValue,
    /// Import graph of the root scene, root first
    pub sources: Vec<PathBuf>,
    /// Theme scenes and their imports not already in `sources`
    pub theme_sources: Vec<PathBuf>,
    /// Names of sources outside `base_path`, left out of the archive
    pub outside_sources: Vec<String>,
    /// Every asset reference found, including missing and remote ones
    pub assets: Vec<AssetReference>,
    /// Archive entry names, in the order they are written
    pub files: DependencySet,
}

impl BundlePlan {
    /// Archive name of the root scene.
    pub fn root_name(&self) -> String {
        archive_name(&relative_to(&self.root_location, &self.base_path))
    }

    /// Distinct remote asset references, which are never bundled.
    pub fn remote_assets(&self) -> Vec<&str> {
        distinct_paths(&self.assets, AssetStatus::Remote)
    }

    /// Distinct asset paths that did not exist while planning.
    pub fn missing_assets(&self) -> Vec<&str> {
        distinct_paths(&self.assets, AssetStatus::Missing)
    }

    /// Distinct asset paths outside `base_path`, which are never bundled.
    pub fn outside_assets(&self) -> Vec<&str> {
        distinct_paths(&self.assets, AssetStatus::Outside)
    }
}

fn distinct_paths(assets: &[AssetReference], status: AssetStatus) -> Vec<&str> {
    assets
        .iter()
        .filter(|asset| asset.status == status)
        .map(|asset| asset.path.as_str())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Outcome of a written bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSummary {
    pub archive: PathBuf,
    /// Entry names written, in archive order
    pub entries: Vec<String>,
    pub skipped_missing: Vec<String>,
    pub skipped_remote: Vec<String>,
    /// Sources and assets outside the root scene's directory
    pub skipped_outside: Vec<String>,
}

/// Path of the archive for `root_location` under `output_dir`.
pub fn archive_path(root_location: &Path, output_dir: &Path) -> PathBuf {
    let stem = root_location.file_stem().map_or_else(
        || "scene".to_string(),
        |stem| stem.to_string_lossy().into_owned(),
    );
    output_dir.join(format!("{}.{}", stem, ARCHIVE_EXTENSION))
}

/// Theme scenes under `base_path/themes`, sorted by file name.
pub fn theme_locations(base_path: &Path) -> Vec<PathBuf> {
    let dir = base_path.join(THEMES_DIR);
    if !dir.is_dir() {
        return Vec::new();
    }

    WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_scene_path(e.path()))
        .map(|e| normalize(e.path()))
        .collect()
}

/// Plan the bundle of the scene at `root_path`.
///
/// # Errors
///
/// Fails if any scene in the import graph of the root, or of a theme,
/// cannot be read or parsed, or if a remote import is rejected.
pub fn plan_bundle(
    root_path: &Path,
    options: &BundleOptions,
    loader: &dyn SceneLoader,
) -> Result<BundlePlan> {
    let root_location = scene_location(root_path);
    let base_path = scene_dir(&root_location).to_path_buf();
    info!("Bundling {}", root_location.display());

    let root = loader.load(&root_location)?;
    let mut graph = collect_imports(root, &root_location, loader, options.remote_imports)?;
    let sources: Vec<PathBuf> = graph.keys().cloned().collect();
    debug!("Import graph has {} scene(s)", sources.len());

    let mut merged = merge_scene(&mut graph, &root_location, loader, options.remote_imports)?;

    let mut assets = Vec::new();
    fetch_dependencies(&mut assets, &mut merged, &base_path, loader);

    let mut theme_sources = Vec::new();
    if options.include_themes {
        for theme in theme_locations(&base_path) {
            if theme == root_location {
                continue;
            }
            debug!("Collecting theme {}", theme.display());
            let scene = loader.load(&theme)?;
            let mut theme_graph = collect_imports(scene, &theme, loader, options.remote_imports)?;
            for location in theme_graph.keys() {
                if !sources.contains(location) && !theme_sources.contains(location) {
                    theme_sources.push(location.clone());
                }
            }
            let mut theme_merged =
                merge_scene(&mut theme_graph, &theme, loader, options.remote_imports)?;
            fetch_dependencies(&mut assets, &mut theme_merged, &base_path, loader);
        }
    }

    let mut files = DependencySet::new();
    let mut outside_sources = Vec::new();
    if options.unified {
        files.insert_source(&root_location, &base_path);
    } else {
        insert_sources(&mut files, &sources, &base_path, &mut outside_sources);
    }
    insert_sources(&mut files, &theme_sources, &base_path, &mut outside_sources);
    files.extend(&assets);

    let plan = BundlePlan {
        root_location,
        base_path,
        merged,
        sources,
        theme_sources,
        outside_sources,
        assets,
        files,
    };

    for remote in plan.remote_assets() {
        debug!("Not bundling remote asset {}", remote);
    }
    info!(
        "Found {} scene source(s) and {} asset reference(s)",
        plan.sources.len() + plan.theme_sources.len(),
        plan.assets.len()
    );

    Ok(plan)
}

fn insert_sources(
    files: &mut DependencySet,
    sources: &[PathBuf],
    base_path: &Path,
    outside: &mut Vec<String>,
) {
    for source in sources {
        if files.insert_source(source, base_path) {
            continue;
        }
        let name = archive_name(&relative_to(source, base_path));
        if is_parent_relative(&name) && !outside.contains(&name) {
            warn!("Not bundling {}: it is outside the scene directory", source.display());
            outside.push(name);
        }
    }
}

/// Write the archive described by `plan`.
pub fn write_bundle(plan: &BundlePlan, options: &BundleOptions) -> Result<BundleSummary> {
    let dest = archive_path(&plan.root_location, &options.output_dir);
    let root_name = plan.root_name();

    let merged_yaml = if options.unified {
        Some(tangram_scene::to_yaml_string(&plan.merged).map_err(BundleError::Emit)?)
    } else {
        None
    };

    let entries: Vec<ArchiveEntry> = plan
        .files
        .iter()
        .map(|name| match &merged_yaml {
            Some(yaml) if name == root_name => ArchiveEntry::bytes(name, yaml.as_bytes()),
            _ => ArchiveEntry::file(name, normalize(&plan.base_path.join(name))),
        })
        .collect();

    let contents = write_archive(&dest, &entries)?;

    let skipped_missing = merge_names(plan.missing_assets(), &contents.missing);
    if !skipped_missing.is_empty() {
        warn!(
            "Skipped {} missing file(s): {}",
            skipped_missing.len(),
            skipped_missing.join(", ")
        );
    }

    let mut outside = plan.outside_sources.clone();
    outside.extend(plan.outside_assets().into_iter().map(str::to_string));
    let skipped_outside = merge_names(
        outside.iter().map(String::as_str).collect(),
        &contents.rejected,
    );

    let summary = BundleSummary {
        archive: dest,
        entries: contents.written,
        skipped_missing,
        skipped_remote: plan
            .remote_assets()
            .into_iter()
            .map(str::to_string)
            .collect(),
        skipped_outside,
    };

    info!(
        "Wrote {} with {} entries",
        summary.archive.display(),
        summary.entries.len()
    );

    Ok(summary)
}

/// `planned` followed by the names of `written` not already in it.
fn merge_names(planned: Vec<&str>, written: &[String]) -> Vec<String> {
    planned
        .into_iter()
        .chain(written.iter().map(String::as_str))
        .collect::<IndexSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Plan and write the bundle of the scene at `root_path` from the filesystem.
pub fn bundle(root_path: &Path, options: &BundleOptions) -> Result<BundleSummary> {
    let plan = plan_bundle(root_path, options, &FsLoader::new())?;
    write_bundle(&plan, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::testing::MemoryLoader;

    fn plan(loader: &MemoryLoader, options: &BundleOptions) -> BundlePlan {
        plan_bundle(Path::new("/s/scene.yaml"), options, loader).unwrap()
    }

    fn names(plan: &BundlePlan) -> Vec<&str> {
        plan.files.iter().collect()
    }

    fn scenario() -> MemoryLoader {
        MemoryLoader::new()
            .with_scene(
                "/s/scene.yaml",
                "import: theme.yaml\nstyles:\n  ground:\n    shaders:\n      uniforms:\n        u_tex: grid\n",
            )
            .with_scene("/s/theme.yaml", "textures:\n  grid:\n    url: grid.png\n")
            .with_file("/s/grid.png")
    }

    #[test]
    fn test_is_scene_path() {
        assert!(is_scene_path(Path::new("scene.yaml")));
        assert!(is_scene_path(Path::new("dir/scene.YML")));
        assert!(!is_scene_path(Path::new("scene.json")));
        assert!(!is_scene_path(Path::new("scene")));
    }

    #[test]
    fn test_archive_path_uses_stem() {
        assert_eq!(
            archive_path(Path::new("/s/my.scene.yaml"), Path::new("/out")),
            PathBuf::from("/out/my.scene.zip")
        );
    }

    #[test]
    fn test_plan_default_mode_lists_sources_and_assets() {
        let plan = plan(&scenario(), &BundleOptions::default());
        assert_eq!(names(&plan), vec!["scene.yaml", "theme.yaml", "grid.png"]);
        assert_eq!(plan.root_name(), "scene.yaml");
        assert_eq!(plan.base_path, PathBuf::from("/s"));
    }

    #[test]
    fn test_plan_unified_mode_lists_root_only() {
        let options = BundleOptions {
            unified: true,
            ..BundleOptions::default()
        };
        let plan = plan(&scenario(), &options);
        assert_eq!(names(&plan), vec!["scene.yaml", "grid.png"]);
        // The uniform keeps its texture name; the texture url is base-relative
        assert_eq!(
            plan.merged
                .get_path(&["styles", "ground", "shaders", "uniforms", "u_tex"])
                .and_then(SceneValue::as_str),
            Some("grid")
        );
        assert_eq!(
            plan.merged
                .get_path(&["textures", "grid", "url"])
                .and_then(SceneValue::as_str),
            Some("grid.png")
        );
    }

    #[test]
    fn test_plan_load_error() {
        let loader = MemoryLoader::new().with_scene("/s/scene.yaml", "import: nowhere.yaml");
        let err = plan_bundle(Path::new("/s/scene.yaml"), &BundleOptions::default(), &loader)
            .unwrap_err();
        assert!(err.is_load_error());
    }

    #[test]
    fn test_plan_tracks_missing_and_remote() {
        let loader = MemoryLoader::new().with_scene(
            "/s/scene.yaml",
            "textures:\n  a:\n    url: a.png\n  b:\n    url: http://example.com/b.png\nfonts:\n  f:\n    url: a.png\n",
        );
        let plan = plan(&loader, &BundleOptions::default());
        assert_eq!(plan.missing_assets(), vec!["a.png"]);
        assert_eq!(plan.remote_assets(), vec!["http://example.com/b.png"]);
        assert_eq!(names(&plan), vec!["scene.yaml"]);
    }

    #[test]
    fn test_plan_excludes_sources_and_assets_outside_base() {
        let loader = MemoryLoader::new()
            .with_scene("/s/scene.yaml", "import: ../shared/base.yaml\n")
            .with_scene(
                "/shared/base.yaml",
                "textures:\n  a:\n    url: a.png\n  b:\n    url: ../s/b.png\n",
            )
            .with_file("/shared/a.png")
            .with_file("/s/b.png");

        let plan = plan(&loader, &BundleOptions::default());
        assert_eq!(names(&plan), vec!["scene.yaml", "b.png"]);
        assert_eq!(plan.outside_sources, vec!["../shared/base.yaml"]);
        assert_eq!(plan.outside_assets(), vec!["../shared/a.png"]);
        assert!(plan.files.iter().all(|name| !name.starts_with("..")));
    }
}
