/*
 * merge.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Folding an import graph into a single scene.
 */

//! Scene merging.
//!
//! Scenes are merged depth-first in post-order: every import of a scene is
//! merged into the accumulator before the scene itself, so the importing
//! scene's fields win over the fields it inherits.
//!
//! # Field merge rule
//!
//! For each field of the incoming scene:
//!
//! - absent from the accumulator: copied in
//! - both sides are maps: merged recursively with this same rule
//! - anything else: the incoming value replaces the accumulated one
//!
//! Sequences are replaced, never concatenated.
//!
//! # Paths
//!
//! Before a scene is folded in, its asset references are resolved against
//! the scene's own directory. Once merged, a relative path would otherwise
//! be read relative to whichever scene ends up importing it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::map::Entry;
use tangram_scene::{SceneMap, SceneValue};
use tracing::debug;

use crate::error::Result;
use crate::imports::{IMPORT_KEY, ImportGraph, RemoteImportPolicy, resolve_imports};
use crate::loader::SceneLoader;
use crate::paths::{is_remote, resolve_reference, scene_dir};
use crate::rules::visit_asset_fields;

/// Traversal state for one merge run.
#[derive(Debug, Default)]
pub struct MergeState {
    /// Scenes on the current import chain; re-entering one is a cycle.
    visiting: HashSet<PathBuf>,
    /// Scenes already folded into the accumulator.
    merged: HashSet<PathBuf>,
}

impl MergeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the scene at `location` has been folded in.
    pub fn is_merged(&self, location: &Path) -> bool {
        self.merged.contains(location)
    }
}

/// Merge the scene at `root_location` and everything it imports into one scene.
///
/// Every scene in `graph` that takes part in the merge has its `import`
/// field removed and its asset paths made absolute, in place.
pub fn merge_scene(
    graph: &mut ImportGraph,
    root_location: &Path,
    loader: &dyn SceneLoader,
    policy: RemoteImportPolicy,
) -> Result<SceneValue> {
    let mut accumulator = SceneMap::new();
    let mut state = MergeState::new();
    merge_recursive(
        &mut accumulator,
        root_location,
        graph,
        &mut state,
        loader,
        policy,
    )?;
    Ok(SceneValue::Map(accumulator))
}

/// Fold the scene at `location`, after its imports, into `accumulator`.
///
/// Cycles are broken silently: a scene already on the current import chain
/// is skipped. A scene already merged through another import chain is not
/// merged again, so it cannot override a scene that imported it earlier.
/// On a diamond (two siblings importing one shared scene) this differs from
/// a traversal guarded by the import chain alone, which would fold the
/// shared scene in a second time between the siblings.
pub fn merge_recursive(
    accumulator: &mut SceneMap,
    location: &Path,
    graph: &mut ImportGraph,
    state: &mut MergeState,
    loader: &dyn SceneLoader,
    policy: RemoteImportPolicy,
) -> Result<()> {
    if state.visiting.contains(location) {
        debug!("Import cycle through {}, skipping", location.display());
        return Ok(());
    }
    if state.merged.contains(location) {
        return Ok(());
    }
    state.visiting.insert(location.to_path_buf());

    let imports = match graph.get(location) {
        Some(scene) => resolve_imports(scene, location, policy)?,
        None => Vec::new(),
    };
    for import in &imports {
        merge_recursive(accumulator, import, graph, state, loader, policy)?;
    }

    state.visiting.remove(location);

    let Some(scene) = graph.get_mut(location) else {
        debug!("{} is not in the import graph", location.display());
        return Ok(());
    };

    scene.remove(IMPORT_KEY);
    resolve_scene_paths(scene, scene_dir(location), loader);

    if let SceneValue::Map(fields) = scene {
        merge_fields(accumulator, fields.clone());
    }
    state.merged.insert(location.to_path_buf());
    debug!("Merged {}", location.display());

    Ok(())
}

/// Merge `incoming` into `target`, field by field.
pub fn merge_fields(target: &mut SceneMap, incoming: SceneMap) {
    for (key, value) in incoming {
        match target.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(mut entry) => match (entry.get_mut(), value) {
                (SceneValue::Map(existing), SceneValue::Map(value)) => {
                    merge_fields(existing, value);
                }
                (existing, value) => *existing = value,
            },
        }
    }
}

/// Rewrite the asset references of a scene against its directory.
///
/// `url` fields are always resolved. Texture slots are resolved only when
/// the file exists next to the scene; otherwise the value is kept as is,
/// since it may name an entry of the `textures` map.
pub fn resolve_scene_paths(scene: &mut SceneValue, dir: &Path, loader: &dyn SceneLoader) {
    visit_asset_fields(scene, |mut site| {
        let reference = site.reference();
        if is_remote(reference) || Path::new(reference).is_absolute() {
            return;
        }
        let resolved = resolve_reference(dir, reference);
        if site.kind.is_texture_slot() && !loader.is_file(Path::new(&resolved)) {
            return;
        }
        site.set_reference(resolved);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::collect_imports;
    use crate::loader::testing::MemoryLoader;

    fn merged(loader: &MemoryLoader, root: &str) -> SceneValue {
        let root_scene = loader.load(Path::new(root)).unwrap();
        let mut graph =
            collect_imports(root_scene, Path::new(root), loader, RemoteImportPolicy::Skip)
                .unwrap();
        merge_scene(&mut graph, Path::new(root), loader, RemoteImportPolicy::Skip).unwrap()
    }

    fn str_at<'a>(scene: &'a SceneValue, path: &[&str]) -> Option<&'a str> {
        scene.get_path(path).and_then(SceneValue::as_str)
    }

    #[test]
    fn test_merge_fields_copies_absent_keys() {
        let mut target = tangram_scene::parse("a: 1").unwrap();
        let incoming = tangram_scene::parse("b: 2").unwrap();
        merge_fields(
            target.as_map_mut().unwrap(),
            incoming.as_map().unwrap().clone(),
        );
        assert_eq!(target, tangram_scene::parse("a: 1\nb: 2").unwrap());
    }

    #[test]
    fn test_merge_fields_replaces_scalars_and_sequences() {
        let mut target = tangram_scene::parse("a: 1\nlist: [1, 2, 3]\nn: ~").unwrap();
        let incoming = tangram_scene::parse("a: 2\nlist: [9]\nn: {x: 1}").unwrap();
        merge_fields(
            target.as_map_mut().unwrap(),
            incoming.as_map().unwrap().clone(),
        );
        assert_eq!(
            target,
            tangram_scene::parse("a: 2\nlist: [9]\nn: {x: 1}").unwrap()
        );
    }

    #[test]
    fn test_merge_fields_map_replaced_by_scalar() {
        let mut target = tangram_scene::parse("style: {texture: a.png}").unwrap();
        let incoming = tangram_scene::parse("style: none").unwrap();
        merge_fields(
            target.as_map_mut().unwrap(),
            incoming.as_map().unwrap().clone(),
        );
        assert_eq!(str_at(&target, &["style"]), Some("none"));
    }

    #[test]
    fn test_merge_fields_deep() {
        let mut target =
            tangram_scene::parse("styles: {water: {texture: a.png, blend: overlay}}").unwrap();
        let incoming = tangram_scene::parse("styles: {water: {order: 5, blend: inlay}}").unwrap();
        merge_fields(
            target.as_map_mut().unwrap(),
            incoming.as_map().unwrap().clone(),
        );
        assert_eq!(
            target,
            tangram_scene::parse("styles: {water: {texture: a.png, blend: inlay, order: 5}}")
                .unwrap()
        );
    }

    #[test]
    fn test_scene_without_imports_is_unchanged() {
        let source = "styles:\n  water:\n    order: 5\nlayers:\n  roads:\n    draw:\n      lines:\n        width: 2px\n";
        let loader = MemoryLoader::new().with_scene("/s/scene.yaml", source);
        let result = merged(&loader, "/s/scene.yaml");
        assert_eq!(result, tangram_scene::parse(source).unwrap());
    }

    #[test]
    fn test_importing_scene_wins() {
        let loader = MemoryLoader::new()
            .with_scene(
                "/s/scene.yaml",
                "import: theme.yaml\nstyles:\n  water:\n    texture: /img/root.png\n",
            )
            .with_scene("/s/theme.yaml", "styles:\n  water:\n    texture: /img/theme.png\n");

        let result = merged(&loader, "/s/scene.yaml");
        assert_eq!(
            str_at(&result, &["styles", "water", "texture"]),
            Some("/img/root.png")
        );
        assert!(result.get(IMPORT_KEY).is_none());
    }

    #[test]
    fn test_deep_merge_keeps_siblings() {
        let loader = MemoryLoader::new()
            .with_scene(
                "/s/scene.yaml",
                "import: theme.yaml\nstyles:\n  water:\n    order: 5\n",
            )
            .with_scene("/s/theme.yaml", "styles:\n  water:\n    texture: a.png\n")
            .with_file("/s/a.png");

        let result = merged(&loader, "/s/scene.yaml");
        let water = result.get_path(&["styles", "water"]).unwrap();
        assert_eq!(
            water.get("order").and_then(SceneValue::as_yaml),
            Some(&tangram_scene::Yaml::Integer(5))
        );
        assert_eq!(
            water.get("texture").and_then(SceneValue::as_str),
            Some("/s/a.png")
        );
    }

    #[test]
    fn test_later_import_overrides_earlier() {
        let loader = MemoryLoader::new()
            .with_scene("/s/scene.yaml", "import: [first.yaml, second.yaml]")
            .with_scene("/s/first.yaml", "scene: {background: {color: red}}")
            .with_scene("/s/second.yaml", "scene: {background: {color: blue}}");

        let result = merged(&loader, "/s/scene.yaml");
        assert_eq!(
            str_at(&result, &["scene", "background", "color"]),
            Some("blue")
        );
    }

    #[test]
    fn test_imported_paths_resolve_against_their_directory() {
        let loader = MemoryLoader::new()
            .with_scene("/scenes/scene.yaml", "import: sub/theme.yaml")
            .with_scene(
                "/scenes/sub/theme.yaml",
                "textures:\n  grid:\n    url: tex.png\nfonts:\n  sans:\n    - url: ../fonts/sans.ttf\n",
            );

        let result = merged(&loader, "/scenes/scene.yaml");
        assert_eq!(
            str_at(&result, &["textures", "grid", "url"]),
            Some("/scenes/sub/tex.png")
        );
        let faces = result
            .get_path(&["fonts", "sans"])
            .and_then(SceneValue::as_sequence)
            .unwrap();
        assert_eq!(
            faces[0].get("url").and_then(SceneValue::as_str),
            Some("/scenes/fonts/sans.ttf")
        );
    }

    #[test]
    fn test_texture_names_survive_merge() {
        let loader = MemoryLoader::new()
            .with_scene(
                "/s/scene.yaml",
                "import: theme.yaml\nstyles:\n  ground:\n    shaders:\n      uniforms:\n        u_tex: grid\n",
            )
            .with_scene("/s/theme.yaml", "textures:\n  grid:\n    url: grid.png\n")
            .with_file("/s/grid.png");

        let result = merged(&loader, "/s/scene.yaml");
        assert_eq!(
            str_at(&result, &["styles", "ground", "shaders", "uniforms", "u_tex"]),
            Some("grid")
        );
        assert_eq!(
            str_at(&result, &["textures", "grid", "url"]),
            Some("/s/grid.png")
        );
    }

    #[test]
    fn test_remote_urls_untouched() {
        let loader = MemoryLoader::new().with_scene(
            "/s/scene.yaml",
            "textures:\n  tiles:\n    url: https://example.com/tiles.png\n",
        );
        let result = merged(&loader, "/s/scene.yaml");
        assert_eq!(
            str_at(&result, &["textures", "tiles", "url"]),
            Some("https://example.com/tiles.png")
        );
    }

    #[test]
    fn test_cycle_merges_each_scene_once() {
        let loader = MemoryLoader::new()
            .with_scene("/s/a.yaml", "import: b.yaml\nname: a\nfrom_a: true\n")
            .with_scene("/s/b.yaml", "import: a.yaml\nname: b\nfrom_b: true\n");

        let result = merged(&loader, "/s/a.yaml");
        assert_eq!(str_at(&result, &["name"]), Some("a"));
        assert!(result.get("from_a").is_some());
        assert!(result.get("from_b").is_some());
    }

    #[test]
    fn test_diamond_import_keeps_importer_precedence() {
        let loader = MemoryLoader::new()
            .with_scene("/s/root.yaml", "import: [left.yaml, right.yaml]")
            .with_scene("/s/left.yaml", "import: shared.yaml\nvalue: left\n")
            .with_scene("/s/right.yaml", "import: shared.yaml\nother: right\n")
            .with_scene("/s/shared.yaml", "value: shared\nother: shared\n");

        let result = merged(&loader, "/s/root.yaml");
        assert_eq!(str_at(&result, &["value"]), Some("left"));
        assert_eq!(str_at(&result, &["other"]), Some("right"));
    }

    #[test]
    fn test_merge_clears_import_fields_in_graph() {
        let loader = MemoryLoader::new()
            .with_scene("/s/scene.yaml", "import: theme.yaml")
            .with_scene("/s/theme.yaml", "import: base.yaml")
            .with_scene("/s/base.yaml", "styles: {}");

        let root = loader.load(Path::new("/s/scene.yaml")).unwrap();
        let mut graph = collect_imports(
            root,
            Path::new("/s/scene.yaml"),
            &loader,
            RemoteImportPolicy::Skip,
        )
        .unwrap();
        merge_scene(
            &mut graph,
            Path::new("/s/scene.yaml"),
            &loader,
            RemoteImportPolicy::Skip,
        )
        .unwrap();

        for scene in graph.values() {
            assert!(scene.get(IMPORT_KEY).is_none());
        }
    }

    #[test]
    fn test_merge_state_tracks_merged_scenes() {
        let loader = MemoryLoader::new().with_scene("/s/scene.yaml", "styles: {}");
        let root = loader.load(Path::new("/s/scene.yaml")).unwrap();
        let mut graph = collect_imports(
            root,
            Path::new("/s/scene.yaml"),
            &loader,
            RemoteImportPolicy::Skip,
        )
        .unwrap();

        let mut accumulator = SceneMap::new();
        let mut state = MergeState::new();
        merge_recursive(
            &mut accumulator,
            Path::new("/s/scene.yaml"),
            &mut graph,
            &mut state,
            &loader,
            RemoteImportPolicy::Skip,
        )
        .unwrap();
        assert!(state.is_merged(Path::new("/s/scene.yaml")));
    }
}
