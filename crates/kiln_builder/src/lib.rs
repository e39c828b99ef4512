//! # kiln_builder
//!
//! Tile metadata assembly for kiln.
//!
//! A tile's metadata is authored as many small YAML fragments: forms, jobs,
//! instance groups, runtime configs and variables, each in its own directory.
//! This crate reads those fragments along with the release and stemcell
//! tarballs, joins instance groups to their jobs, and merges everything with
//! the base metadata into one document.
//!
//! - **Readers**: filesystem and tarball implementations of the collaborator traits
//! - **Builder**: ordered, fail-fast assembly into [`GeneratedMetadata`]
//! - **Interpolator**: `$( variable "KEY" )` substitution on the rendered YAML
//! - **Mock**: recording fakes for tests
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use kiln_builder::{interpolate, BuildInput, MetadataBuilder};
//!
//! let input = BuildInput {
//!     metadata_path: "metadata/base.yml".into(),
//!     version: "1.2.3".to_string(),
//!     release_tarballs: vec!["releases/cf-287.tgz".into()],
//!     stemcell_tarball: "stemcell.tgz".into(),
//!     instance_group_directories: vec!["instance_groups".into()],
//!     job_directories: vec!["jobs".into()],
//!     icon_path: "icon.png".into(),
//!     ..Default::default()
//! };
//!
//! let metadata = MetadataBuilder::new().build(&input).unwrap();
//! let yaml = metadata.to_yaml().unwrap();
//!
//! let mut variables = HashMap::new();
//! variables.insert("env".to_string(), "prod".to_string());
//! let rendered = interpolate(&yaml, &variables).unwrap();
//! ```

pub mod archive;
pub mod builder;
pub mod error;
pub mod interpolator;
pub mod metadata;
pub mod mock;
pub mod models;
pub mod parts;
pub mod reader;

pub use archive::{ReleaseTarballReader, StemcellTarballReader};
pub use builder::{BuildInput, MetadataBuilder};
pub use error::{BuilderError, BuilderResult, InterpolationError, InterpolationResult};
pub use interpolator::{interpolate, Interpolator};
pub use metadata::{Base64IconEncoder, MetadataFileReader};
pub use models::{
    GeneratedMetadata, Metadata, Part, Release, ReleaseManifest, StemcellCriteria,
    StemcellManifest,
};
pub use parts::PartsDirectoryReader;
pub use reader::{
    IconEncoder, Logger, MetadataReader, PartsReader, ReleaseManifestReader,
    StemcellManifestReader, TracingLogger,
};
