//! tangram-bundle - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tangram_bundler::RemoteImportPolicy;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "tangram-bundle")]
#[command(version)]
#[command(about = "Package a Tangram scene and its assets into a zip archive", long_about = None)]
struct Cli {
    /// Root scene file (.yaml or .yml)
    input: PathBuf,

    /// Store one merged scene file instead of the scene and its imports
    #[arg(short = 'u', long)]
    unified: bool,

    /// Write the archive to DIR (defaults to the working directory)
    #[arg(short = 'o', long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// What to do with imports that point at a URL (skip, reject)
    #[arg(long, value_name = "POLICY", default_value = "skip", value_parser = parse_policy)]
    remote_imports: RemoteImportPolicy,

    /// Do not bundle themes/*.yaml next to the scene
    #[arg(long)]
    no_themes: bool,

    /// Only report warnings and errors
    #[arg(short = 'q', long)]
    quiet: bool,
}

fn parse_policy(value: &str) -> std::result::Result<RemoteImportPolicy, String> {
    RemoteImportPolicy::try_from(value)
}

impl Cli {
    fn into_args(self) -> commands::bundle::BundleArgs {
        commands::bundle::BundleArgs {
            input: self.input,
            unified: self.unified,
            output_dir: self.output_dir,
            remote_imports: self.remote_imports,
            include_themes: !self.no_themes,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet {
        "warn"
    } else {
        "tangram_bundle=info,tangram_bundler=info"
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    commands::bundle::execute(cli.into_args())
}
