/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for tangram-bundler
 */

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Failed to read scene file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scene file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: tangram_scene::Error,
    },

    #[error("Remote scene import is not supported: {reference} (imported from {})", importer.display())]
    RemoteImport { reference: String, importer: PathBuf },

    #[error("Failed to write archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to serialize merged scene: {0}")]
    Emit(#[source] tangram_scene::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BundleError {
    /// Whether this error comes from loading the scene graph.
    ///
    /// Load errors abort a run before any archive is written.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            BundleError::Read { .. } | BundleError::Parse { .. } | BundleError::RemoteImport { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BundleError>;
