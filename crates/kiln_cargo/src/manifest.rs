//! Deployment manifest model.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::CargoResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub releases: Vec<ManifestRelease>,
    pub stemcells: Vec<ManifestStemcell>,
    pub update: Update,
    pub variables: Vec<ManifestVariable>,
    pub instance_groups: Vec<InstanceGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestRelease {
    pub name: String,
    pub version: String,
}

/// The stemcell every instance group deploys onto, referenced by alias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestStemcell {
    pub alias: String,
    pub os: String,
    pub version: String,
}

/// Rollout policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub canaries: u32,
    pub canary_watch_time: String,
    pub update_watch_time: String,
    pub max_in_flight: u32,
    pub max_errors: u32,
    pub serial: bool,
}

impl Default for Update {
    fn default() -> Self {
        Self {
            canaries: 1,
            canary_watch_time: "30000-300000".to_string(),
            update_watch_time: "30000-300000".to_string(),
            max_in_flight: 1,
            max_errors: 2,
            serial: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Service,
    Errand,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Service => "service",
            Lifecycle::Errand => "errand",
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceGroup {
    pub name: String,
    pub azs: Vec<String>,
    pub lifecycle: Lifecycle,
    pub stemcell: String,
    pub instances: i64,
}

impl Manifest {
    pub fn to_yaml(&self) -> CargoResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
