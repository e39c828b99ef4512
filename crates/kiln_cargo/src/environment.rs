//! Live platform state the manifest is generated against.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CargoError, CargoResult};
use crate::template::scalar_string;

/// Deployment name, availability zones, uploaded stemcells and per-group
/// resource overrides, as reported by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub deployment_name: String,
    pub availability_zones: Vec<String>,
    pub stemcells: Vec<AvailableStemcell>,
    pub resource_configs: Vec<ResourceConfig>,
}

/// A stemcell uploaded to the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailableStemcell {
    pub name: String,
    pub os: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    #[serde(default)]
    pub instances: Instances,
}

/// Instance count override: a number, or `"automatic"` to keep the tile default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instances {
    Count(i64),
    Keyword(String),
}

impl Default for Instances {
    fn default() -> Self {
        Instances::Keyword(Self::AUTOMATIC.to_string())
    }
}

impl Instances {
    pub const AUTOMATIC: &'static str = "automatic";

    pub fn automatic() -> Self {
        Self::default()
    }

    pub fn is_automatic(&self) -> bool {
        matches!(self, Instances::Keyword(keyword) if keyword == Self::AUTOMATIC)
    }

    /// The concrete count, if one was set.
    pub fn value(&self) -> Option<i64> {
        match self {
            Instances::Count(count) => Some(*count),
            Instances::Keyword(_) => None,
        }
    }
}

impl EnvironmentConfig {
    pub fn from_json(json: &str) -> CargoResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> CargoResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a `.json`, `.yml` or `.yaml` file.
    pub fn load(path: &Path) -> CargoResult<Self> {
        debug!("Loading environment config from {:?}", path);

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Self::from_json(&fs::read_to_string(path)?),
            Some("yml") | Some("yaml") => Self::from_yaml(&fs::read_to_string(path)?),
            _ => Err(CargoError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_config() {
        let config = EnvironmentConfig::from_json(
            r#"{
                "deployment_name": "cf-1234",
                "availability_zones": ["z1", "z2"],
                "stemcells": [
                    {"name": "default", "os": "ubuntu-trusty", "version": 3586.25}
                ],
                "resource_configs": [
                    {"name": "router", "instances": 4},
                    {"name": "diego_cell", "instances": "automatic"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.deployment_name, "cf-1234");
        assert_eq!(config.availability_zones, vec!["z1", "z2"]);
        assert_eq!(config.stemcells[0].version, "3586.25");
        assert_eq!(config.resource_configs[0].instances.value(), Some(4));
        assert!(config.resource_configs[1].instances.is_automatic());
    }

    #[test]
    fn test_missing_instances_is_automatic() {
        let config =
            EnvironmentConfig::from_yaml("resource_configs:\n- name: router\n").unwrap();
        assert_eq!(config.resource_configs[0].instances, Instances::automatic());
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let err = EnvironmentConfig::load(Path::new("env.toml")).unwrap_err();
        assert!(matches!(err, CargoError::UnsupportedFormat(_)));
    }
}
