//! Error types for metadata assembly.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for builder operations.
pub type BuilderResult<T> = Result<T, BuilderError>;

/// Errors that can occur while assembling tile metadata.
#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("error reading from {kind} directory {path:?}: {source}")]
    DirectoryRead {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: Box<BuilderError>,
    },

    #[error("instance group {group:?} references non-existent job {job:?}")]
    MissingJob { group: String, job: String },

    #[error("instance group {0:?} has a malformed templates section")]
    InvalidTemplates(String),

    #[error("missing \"name\" in tile metadata")]
    MissingName,

    #[error("runtime_config section must be defined using --runtime-configs-directory flag")]
    RuntimeConfigsInMetadata,

    #[error("variables section must be defined using --variables-directory flag")]
    VariablesInMetadata,

    #[error("tile metadata in {0:?} is not a map")]
    MetadataNotAMap(PathBuf),

    #[error("cannot unmarshal '{path}': {source}")]
    Unmarshal {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("metadata parts not found in file {0}")]
    PartsNotFound(String),

    #[error("metadata item '{0}' must be a map")]
    PartNotAMap(String),

    #[error("metadata item '{0}' does not have a `name` field")]
    PartMissingName(String),

    #[error("file specified in _order.yml {name:?} does not exist in {dir:?}")]
    OrderedPartMissing { name: String, dir: PathBuf },

    #[error("could not find {manifest} in {archive:?}")]
    ArchiveManifestMissing {
        manifest: &'static str,
        archive: PathBuf,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Failure reported by an external collaborator, carried verbatim.
    #[error("{0}")]
    Collaborator(String),
}

/// Result type alias for interpolation.
pub type InterpolationResult<T> = Result<T, InterpolationError>;

/// Errors raised while interpolating variables into rendered metadata.
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("template parsing failed: {0}")]
    Parse(String),

    #[error("template execution failed: could not find variable with key '{0}'")]
    MissingVariable(String),
}
