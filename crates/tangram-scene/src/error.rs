//! Error types for scene parsing.

use thiserror::Error;

/// Result type alias for tangram-scene operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing or emitting a scene document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// YAML syntax error
    #[error("Parse error{}: {message}", file_suffix(file))]
    Parse {
        message: String,
        file: Option<String>,
    },

    /// The document parsed but does not have the shape of a scene
    #[error("Invalid scene structure{}: {message}", file_suffix(file))]
    InvalidStructure {
        message: String,
        file: Option<String>,
    },

    /// Serializing a scene back to YAML failed
    #[error("Failed to emit YAML: {0}")]
    Emit(String),
}

fn file_suffix(file: &Option<String>) -> String {
    match file {
        Some(file) => format!(" in {}", file),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn parse(err: yaml_rust2::ScanError, file: Option<&str>) -> Self {
        Error::Parse {
            message: err.to_string(),
            file: file.map(str::to_string),
        }
    }
}
