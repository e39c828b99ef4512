//! # kiln_cargo
//!
//! Deployment manifest generation for kiln.
//!
//! Takes a tile's metadata ([`ProductTemplate`]) and the state of a running
//! platform ([`EnvironmentConfig`]) and produces the [`Manifest`] the director
//! deploys: releases, the matching stemcell, rollout policy, variables and one
//! instance group per job type.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use kiln_cargo::{EnvironmentConfig, Generator, ProductTemplate};
//!
//! let template = ProductTemplate::load(Path::new("metadata.yml")).unwrap();
//! let config = EnvironmentConfig::load(Path::new("environment.json")).unwrap();
//!
//! let manifest = Generator::new().execute(&template, &config);
//! println!("{}", manifest.to_yaml().unwrap());
//! ```

pub mod environment;
pub mod error;
pub mod generator;
pub mod manifest;
pub mod template;

pub use environment::{AvailableStemcell, EnvironmentConfig, Instances, ResourceConfig};
pub use error::{CargoError, CargoResult};
pub use generator::Generator;
pub use manifest::{
    InstanceGroup, Lifecycle, Manifest, ManifestRelease, ManifestStemcell, ManifestVariable,
    Update,
};
pub use template::{
    InstanceDefinition, JobType, ProductTemplate, TemplateRelease, TemplateStemcellCriteria,
    TemplateVariable,
};
