//! Product template: the parts of a tile's metadata the generator consumes.

use std::fs;
use std::path::Path;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use tracing::debug;

use crate::error::CargoResult;

/// A tile's metadata, reduced to what a deployment manifest needs.
///
/// Unknown keys in the source document are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductTemplate {
    pub name: String,
    pub releases: Vec<TemplateRelease>,
    pub stemcell_criteria: TemplateStemcellCriteria,
    pub job_types: Vec<JobType>,
    pub variables: Vec<TemplateVariable>,
    pub serial: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateRelease {
    pub name: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
    pub file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateStemcellCriteria {
    pub os: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
}

/// An instance group declared by the tile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobType {
    pub name: String,
    pub errand: bool,
    pub instance_definition: InstanceDefinition,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceDefinition {
    pub default: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub options: Option<Value>,
}

impl ProductTemplate {
    pub fn from_yaml(yaml: &str) -> CargoResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a template from a tile metadata file.
    pub fn load(path: &Path) -> CargoResult<Self> {
        debug!("Loading product template from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// Versions show up as strings or bare numbers depending on who wrote the file.
pub(crate) fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "expected a version string, found {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_template_ignores_unknown_keys() {
        let template = ProductTemplate::from_yaml(
            r#"
name: cool-product
product_version: 1.2.3
releases:
- name: cf
  version: "287"
  file: cf-287.tgz
stemcell_criteria:
  os: ubuntu-trusty
  version: 3586.25
  requires_cpi: false
job_types:
- name: router
  label: Router
  instance_definition:
    name: instances
    type: integer
    default: 3
- name: smoke-tests
  errand: true
  instance_definition:
    default: 1
variables:
- name: root-ca
  type: certificate
  options:
    is_ca: true
serial: true
"#,
        )
        .unwrap();

        assert_eq!(template.name, "cool-product");
        assert_eq!(template.releases[0].version, "287");
        assert_eq!(template.stemcell_criteria.os, "ubuntu-trusty");
        assert_eq!(template.stemcell_criteria.version, "3586.25");
        assert_eq!(template.job_types[0].instance_definition.default, 3);
        assert!(!template.job_types[0].errand);
        assert!(template.job_types[1].errand);
        assert_eq!(template.variables[0].kind, "certificate");
        assert!(template.variables[0].options.is_some());
        assert!(template.serial);
    }

    #[test]
    fn test_parse_empty_template() {
        let template = ProductTemplate::from_yaml("{}").unwrap();
        assert_eq!(template, ProductTemplate::default());
    }
}
