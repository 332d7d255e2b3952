/*
 * archive.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Zip archive assembly.
 */

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tracing::{debug, warn};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::FileOptions;

use crate::error::{BundleError, Result};
use crate::paths::is_parent_relative;

/// Where the bytes of an archive entry come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    File(PathBuf),
    Bytes(Vec<u8>),
}

/// One file to store in the archive under `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub source: EntrySource,
}

impl ArchiveEntry {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: EntrySource::File(path.into()),
        }
    }

    pub fn bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            source: EntrySource::Bytes(bytes.into()),
        }
    }
}

/// Entry names written, and those skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveContents {
    pub written: Vec<String>,
    /// File entries whose path is not a regular file
    pub missing: Vec<String>,
    /// Names that would extract outside the archive root
    pub rejected: Vec<String>,
}

/// Write `entries` to a new zip file at `dest`.
///
/// Entries are stored in order; a name seen before is skipped. A file
/// entry whose path is not a regular file is skipped and reported in
/// [`ArchiveContents::missing`]. Absolute and `..` names are skipped and
/// reported in [`ArchiveContents::rejected`]. The parent directory of
/// `dest` is created if needed. On failure the partial archive is removed.
pub fn write_archive(dest: &Path, entries: &[ArchiveEntry]) -> Result<ArchiveContents> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(dest).map_err(|e| archive_error(dest, ZipError::Io(e)))?;
    let result = write_entries(file, dest, entries);
    if result.is_err() {
        let _ = std::fs::remove_file(dest);
    }
    result
}

fn write_entries(file: File, dest: &Path, entries: &[ArchiveEntry]) -> Result<ArchiveContents> {
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut seen = IndexSet::new();
    let mut contents = ArchiveContents::default();

    for entry in entries {
        if !seen.insert(entry.name.as_str()) {
            debug!("Skipping duplicate archive entry {}", entry.name);
            continue;
        }

        if is_parent_relative(&entry.name) {
            warn!("Refusing archive entry outside the archive root: {}", entry.name);
            contents.rejected.push(entry.name.clone());
            continue;
        }

        let data = match &entry.source {
            EntrySource::Bytes(bytes) => bytes.clone(),
            EntrySource::File(path) if path.is_file() => std::fs::read(path)?,
            EntrySource::File(path) => {
                warn!("Skipping {}: not a regular file", path.display());
                contents.missing.push(entry.name.clone());
                continue;
            }
        };

        zip.start_file(entry.name.as_str(), options)
            .map_err(|e| archive_error(dest, e))?;
        zip.write_all(&data)
            .map_err(|e| archive_error(dest, ZipError::Io(e)))?;
        debug!("Added {} ({} bytes)", entry.name, data.len());
        contents.written.push(entry.name.clone());
    }

    zip.finish().map_err(|e| archive_error(dest, e))?;
    Ok(contents)
}

fn archive_error(dest: &Path, source: ZipError) -> BundleError {
    BundleError::Archive {
        path: dest.to_path_buf(),
        source,
    }
}
