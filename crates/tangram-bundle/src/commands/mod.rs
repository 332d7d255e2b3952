//! Command implementations for tangram-bundle
//!
//! Commands handle the CLI interface and delegate to tangram-bundler for
//! the actual work.

pub mod bundle;
