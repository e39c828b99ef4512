//! Fake collaborators for testing.
//!
//! Each fake returns canned responses keyed by path, captures the arguments it
//! was called with, and can be told to fail. They are cheap to clone and share
//! state between clones, so a test can hand one to a [`crate::MetadataBuilder`]
//! and still inspect it afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{BuilderError, BuilderResult};
use crate::models::{Metadata, Part, ReleaseManifest, StemcellManifest};
use crate::reader::{
    IconEncoder, Logger, MetadataReader, PartsReader, ReleaseManifestReader,
    StemcellManifestReader,
};

/// Canned responses keyed by path, with an optional blanket failure.
#[derive(Debug)]
struct Responses<T> {
    by_path: HashMap<PathBuf, T>,
    fallback: Option<T>,
    failure: Option<String>,
    calls: Vec<PathBuf>,
}

impl<T> Default for Responses<T> {
    fn default() -> Self {
        Self {
            by_path: HashMap::new(),
            fallback: None,
            failure: None,
            calls: Vec::new(),
        }
    }
}

impl<T: Clone> Responses<T> {
    fn respond(&mut self, path: &Path, what: &str) -> BuilderResult<T> {
        self.calls.push(path.to_path_buf());

        if let Some(message) = &self.failure {
            return Err(BuilderError::Collaborator(message.clone()));
        }

        self.by_path
            .get(path)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| {
                BuilderError::Collaborator(format!("could not read {} {:?}", what, path))
            })
    }
}

/// Fake [`PartsReader`].
#[derive(Clone, Default)]
pub struct FakePartsReader {
    state: Arc<RwLock<Responses<Vec<Part>>>>,
}

impl FakePartsReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `parts` when `path` is read.
    pub fn with_parts(self, path: impl Into<PathBuf>, parts: Vec<Part>) -> Self {
        self.state.write().by_path.insert(path.into(), parts);
        self
    }

    /// Fail every read with `message`.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        self.state.write().failure = Some(message.into());
        self
    }

    /// Paths read so far, in call order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.state.read().calls.clone()
    }
}

impl PartsReader for FakePartsReader {
    fn read(&self, path: &Path) -> BuilderResult<Vec<Part>> {
        self.state.write().respond(path, "directory")
    }
}

/// Fake [`ReleaseManifestReader`].
#[derive(Clone, Default)]
pub struct FakeReleaseReader {
    state: Arc<RwLock<Responses<ReleaseManifest>>>,
}

impl FakeReleaseReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_release(
        self,
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.state.write().by_path.insert(
            path.into(),
            ReleaseManifest {
                name: name.into(),
                version: version.into(),
            },
        );
        self
    }

    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        self.state.write().failure = Some(message.into());
        self
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.state.read().calls.clone()
    }
}

impl ReleaseManifestReader for FakeReleaseReader {
    fn read(&self, path: &Path) -> BuilderResult<ReleaseManifest> {
        self.state.write().respond(path, "release")
    }
}

/// Fake [`StemcellManifestReader`] returning the same manifest for any path.
#[derive(Clone, Default)]
pub struct FakeStemcellReader {
    state: Arc<RwLock<Responses<StemcellManifest>>>,
}

impl FakeStemcellReader {
    pub fn new(version: impl Into<String>, operating_system: impl Into<String>) -> Self {
        let fake = Self::default();
        fake.state.write().fallback = Some(StemcellManifest {
            version: version.into(),
            operating_system: operating_system.into(),
        });
        fake
    }

    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        self.state.write().failure = Some(message.into());
        self
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.state.read().calls.clone()
    }
}

impl StemcellManifestReader for FakeStemcellReader {
    fn read(&self, path: &Path) -> BuilderResult<StemcellManifest> {
        self.state.write().respond(path, "stemcell")
    }
}

/// Fake [`MetadataReader`] returning the same document for any path.
#[derive(Clone, Default)]
pub struct FakeMetadataReader {
    state: Arc<RwLock<Responses<Metadata>>>,
    versions: Arc<RwLock<Vec<String>>>,
}

impl FakeMetadataReader {
    pub fn new(metadata: Metadata) -> Self {
        let fake = Self::default();
        fake.state.write().fallback = Some(metadata);
        fake
    }

    /// Parse the canned document from YAML.
    pub fn from_yaml(yaml: &str) -> Self {
        Self::new(serde_yaml::from_str(yaml).unwrap_or_default())
    }

    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        self.state.write().failure = Some(message.into());
        self
    }

    /// `(path, version)` pairs read so far.
    pub fn calls(&self) -> Vec<(PathBuf, String)> {
        let paths = self.state.read().calls.clone();
        let versions = self.versions.read().clone();
        paths.into_iter().zip(versions).collect()
    }
}

impl MetadataReader for FakeMetadataReader {
    fn read(&self, path: &Path, version: &str) -> BuilderResult<Metadata> {
        self.versions.write().push(version.to_string());
        self.state.write().respond(path, "metadata")
    }
}

/// Fake [`IconEncoder`].
#[derive(Clone, Default)]
pub struct FakeIconEncoder {
    state: Arc<RwLock<Responses<String>>>,
}

impl FakeIconEncoder {
    pub fn new(encoded: impl Into<String>) -> Self {
        let fake = Self::default();
        fake.state.write().fallback = Some(encoded.into());
        fake
    }

    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        self.state.write().failure = Some(message.into());
        self
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.state.read().calls.clone()
    }
}

impl IconEncoder for FakeIconEncoder {
    fn encode(&self, path: &Path) -> BuilderResult<String> {
        self.state.write().respond(path, "icon")
    }
}

/// Logger that keeps every line it receives.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    lines: Arc<RwLock<Vec<String>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.read().clone()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, line: &str) {
        self.lines.write().push(line.to_string());
    }
}
