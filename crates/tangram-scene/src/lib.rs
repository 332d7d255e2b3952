//! # tangram-scene
//!
//! Document model for Tangram scene files.
//!
//! A scene file is a YAML mapping whose well-known top-level keys (`import`,
//! `fonts`, `textures`, `styles`, `layers`) nest further mappings, sequences
//! and scalars. This crate parses such files into [`SceneValue`], a tagged
//! tree that the bundler can merge and rewrite, and emits the tree back as
//! YAML text.
//!
//! ## Example
//!
//! ```rust
//! use tangram_scene::parse;
//!
//! let scene = parse("textures:\n  grid:\n    url: grid.png\n").unwrap();
//! assert_eq!(
//!     scene.get_path(&["textures", "grid", "url"]).and_then(|v| v.as_str()),
//!     Some("grid.png")
//! );
//! ```

mod convert;
mod error;
mod value;

pub use convert::{parse, parse_file, scene_value_from_yaml, to_yaml, to_yaml_string};
pub use error::{Error, Result};
pub use value::{SceneMap, SceneValue};

// Re-export for callers building scalar values
pub use yaml_rust2::Yaml;
