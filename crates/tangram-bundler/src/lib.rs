//! Bundling of Tangram scenes into self-contained archives.
//!
//! A scene may import other scenes and reference fonts, textures and shader
//! images by path. This crate resolves the whole import graph of a root
//! scene, merges it into one document and collects every asset the scene
//! needs, so that scene and assets can be shipped as a single zip file.
//!
//! # Architecture
//!
//! The pipeline runs in this order:
//!
//! - [`SceneLoader`] - Reads and parses scene documents
//! - [`collect_imports`] - Loads the transitive import graph of the root
//! - [`merge_scene`] - Folds the graph into one document, importer wins
//! - [`fetch_dependencies`] - Finds asset references and makes them base-relative
//! - [`write_archive`] - Stores sources, merged scene and assets in a zip
//!
//! [`plan_bundle`] and [`write_bundle`] drive the pipeline for a root scene.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use tangram_bundler::{BundleOptions, bundle};
//!
//! let options = BundleOptions {
//!     unified: true,
//!     ..BundleOptions::default()
//! };
//! let summary = bundle(Path::new("scene.yaml"), &options)?;
//! println!("wrote {}", summary.archive.display());
//! ```

pub mod archive;
pub mod bundle;
pub mod dependencies;
pub mod error;
pub mod imports;
pub mod loader;
pub mod merge;
pub mod paths;
pub mod rules;

// Re-export commonly used types
pub use archive::{ArchiveContents, ArchiveEntry, EntrySource, write_archive};
pub use bundle::{
    BundleOptions, BundlePlan, BundleSummary, archive_path, bundle, is_scene_path, plan_bundle,
    theme_locations, write_bundle,
};
pub use dependencies::{AssetReference, AssetStatus, DependencySet, fetch_dependencies};
pub use error::{BundleError, Result};
pub use imports::{ImportGraph, RemoteImportPolicy, collect_imports};
pub use loader::{FsLoader, SceneLoader};
pub use merge::{MergeState, merge_fields, merge_recursive, merge_scene};
pub use rules::AssetKind;
