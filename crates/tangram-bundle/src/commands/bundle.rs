/*
 * bundle.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Bundle command implementation
 */

//! Bundle command implementation.
//!
//! Validates the input scene, plans the bundle and writes
//! `<stem>.zip` into the output directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use tangram_bundler::{
    BundleOptions, FsLoader, RemoteImportPolicy, is_scene_path, plan_bundle, write_bundle,
};

/// Arguments for the bundle command
#[derive(Debug)]
pub struct BundleArgs {
    /// Root scene file
    pub input: PathBuf,
    /// Store the merged scene instead of the import sources
    pub unified: bool,
    /// Output directory, defaults to the working directory
    pub output_dir: Option<PathBuf>,
    pub remote_imports: RemoteImportPolicy,
    pub include_themes: bool,
}

impl BundleArgs {
    fn options(&self) -> BundleOptions {
        BundleOptions {
            unified: self.unified,
            output_dir: self
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            remote_imports: self.remote_imports,
            include_themes: self.include_themes,
        }
    }
}

/// Execute the bundle command
pub fn execute(args: BundleArgs) -> Result<()> {
    validate_input(&args.input)?;

    let options = args.options();
    debug!("Bundle options: {:?}", options);

    let plan = plan_bundle(&args.input, &options, &FsLoader::new())
        .with_context(|| format!("Failed to bundle {}", args.input.display()))?;

    let summary = write_bundle(&plan, &options).context("Failed to write bundle")?;

    if !summary.skipped_outside.is_empty() {
        warn!(
            "Left {} file(s) outside the scene directory out of the bundle",
            summary.skipped_outside.len()
        );
    }
    if !summary.skipped_remote.is_empty() {
        warn!(
            "Left {} remote asset(s) out of the bundle",
            summary.skipped_remote.len()
        );
    }
    info!(
        "Bundled {} file(s) into {}",
        summary.entries.len(),
        summary.archive.display()
    );

    Ok(())
}

/// The input must be an existing scene file.
fn validate_input(input: &Path) -> Result<()> {
    if !is_scene_path(input) {
        anyhow::bail!(
            "Input must be a .yaml or .yml scene file: {}",
            input.display()
        );
    }
    if !input.is_file() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(input: PathBuf, output_dir: &Path) -> BundleArgs {
        BundleArgs {
            input,
            unified: false,
            output_dir: Some(output_dir.to_path_buf()),
            remote_imports: RemoteImportPolicy::Skip,
            include_themes: true,
        }
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("scene.json");
        fs::write(&input, "{}").unwrap();

        let err = execute(args(input, temp.path())).unwrap_err();
        assert!(err.to_string().contains(".yaml or .yml"));
    }

    #[test]
    fn test_rejects_missing_input() {
        let temp = TempDir::new().unwrap();
        let err = execute(args(temp.path().join("scene.yaml"), temp.path())).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_writes_archive() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("scene.yaml");
        fs::write(&input, "textures:\n  grid:\n    url: grid.png\n").unwrap();
        fs::write(temp.path().join("grid.png"), "png").unwrap();

        let output = temp.path().join("dist");
        execute(args(input, &output)).unwrap();
        assert!(output.join("scene.zip").is_file());
    }

    #[test]
    fn test_load_error_has_context() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("scene.yaml");
        fs::write(&input, "import: missing.yaml\n").unwrap();

        let output = temp.path().join("dist");
        let err = execute(args(input, &output)).unwrap_err();
        assert!(err.to_string().starts_with("Failed to bundle"));
        assert!(!output.join("scene.zip").exists());
    }

    #[test]
    fn test_options_default_output_dir() {
        let mut bundle_args = args(PathBuf::from("scene.yaml"), Path::new("unused"));
        bundle_args.output_dir = None;
        bundle_args.unified = true;

        let options = bundle_args.options();
        assert_eq!(options.output_dir, PathBuf::from("."));
        assert!(options.unified);
        assert!(options.include_themes);
    }
}
