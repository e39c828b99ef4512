//! Error types for manifest generation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for manifest operations.
pub type CargoResult<T> = Result<T, CargoError>;

/// Errors that can occur while loading generator inputs or rendering a manifest.
#[derive(Error, Debug)]
pub enum CargoError {
    #[error("unsupported config format {0:?}: expected .json, .yml or .yaml")]
    UnsupportedFormat(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
