/*
 * loader.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Scene loading abstraction.
 */

//! Scene loading.
//!
//! The bundler never reads the filesystem directly while resolving a scene:
//! documents and existence checks come from a [`SceneLoader`]. [`FsLoader`]
//! is the native implementation.

use std::path::Path;

use tangram_scene::SceneValue;

use crate::error::{BundleError, Result};
use crate::paths::path_to_string;

/// Source of scene documents and file existence information.
pub trait SceneLoader {
    /// Read and parse the scene at `location`.
    fn load(&self, location: &Path) -> Result<SceneValue>;

    /// Whether `location` is an existing regular file.
    fn is_file(&self, location: &Path) -> bool;
}

/// Loader backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl FsLoader {
    pub fn new() -> Self {
        Self
    }
}

impl SceneLoader for FsLoader {
    fn load(&self, location: &Path) -> Result<SceneValue> {
        let content = std::fs::read_to_string(location).map_err(|source| BundleError::Read {
            path: location.to_path_buf(),
            source,
        })?;

        tangram_scene::parse_file(&content, &path_to_string(location)).map_err(|source| {
            BundleError::Parse {
                path: location.to_path_buf(),
                source,
            }
        })
    }

    fn is_file(&self, location: &Path) -> bool {
        location.is_file()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory loader for exercising the core without a filesystem.

    use std::collections::{HashMap, HashSet};
    use std::path::{Path, PathBuf};

    use tangram_scene::SceneValue;

    use super::SceneLoader;
    use crate::error::{BundleError, Result};

    #[derive(Debug, Default)]
    pub struct MemoryLoader {
        scenes: HashMap<PathBuf, String>,
        files: HashSet<PathBuf>,
    }

    impl MemoryLoader {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_scene(mut self, path: &str, content: &str) -> Self {
            self.scenes.insert(PathBuf::from(path), content.to_string());
            self
        }

        pub fn with_file(mut self, path: &str) -> Self {
            self.files.insert(PathBuf::from(path));
            self
        }
    }

    impl SceneLoader for MemoryLoader {
        fn load(&self, location: &Path) -> Result<SceneValue> {
            let content = self.scenes.get(location).ok_or_else(|| BundleError::Read {
                path: location.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such scene"),
            })?;
            tangram_scene::parse(content).map_err(|source| BundleError::Parse {
                path: location.to_path_buf(),
                source,
            })
        }

        fn is_file(&self, location: &Path) -> bool {
            self.files.contains(location) || self.scenes.contains_key(location)
        }
    }
}
