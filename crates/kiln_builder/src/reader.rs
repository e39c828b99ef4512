//! Collaborator seams used by the metadata builder.
//!
//! Each trait has a filesystem-backed implementation in this crate and a
//! recording fake in [`crate::mock`].

use std::path::Path;

use tracing::info;

use crate::error::BuilderResult;
use crate::models::{Metadata, Part, ReleaseManifest, StemcellManifest};

/// Reads every metadata part found in a directory.
pub trait PartsReader {
    fn read(&self, path: &Path) -> BuilderResult<Vec<Part>>;
}

/// Reads the embedded manifest of a release tarball.
pub trait ReleaseManifestReader {
    fn read(&self, path: &Path) -> BuilderResult<ReleaseManifest>;
}

/// Reads the embedded manifest of a stemcell tarball.
pub trait StemcellManifestReader {
    fn read(&self, path: &Path) -> BuilderResult<StemcellManifest>;
}

/// Reads the base tile metadata document.
pub trait MetadataReader {
    fn read(&self, path: &Path, version: &str) -> BuilderResult<Metadata>;
}

/// Encodes the tile icon into an embeddable string.
pub trait IconEncoder {
    fn encode(&self, path: &Path) -> BuilderResult<String>;
}

/// Progress sink for the builder's read steps.
pub trait Logger {
    fn log(&self, line: &str);
}

/// Logger that forwards progress lines to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, line: &str) {
        info!("{}", line);
    }
}
