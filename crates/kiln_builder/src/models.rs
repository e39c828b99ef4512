//! Tile metadata models.
//!
//! These types describe the fragments read from disk ([`Part`], [`ReleaseManifest`],
//! [`StemcellManifest`]) and the assembled document ([`GeneratedMetadata`]) that is
//! serialized into the tile's metadata file.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Opaque, insertion-ordered metadata document.
pub type Metadata = Mapping;

/// Keys the builder owns; base metadata values for these never reach the output.
pub const GENERATED_KEYS: &[&str] = &[
    "name",
    "stemcell_criteria",
    "releases",
    "icon_image",
    "form_types",
    "job_types",
    "runtime_configs",
    "variables",
];

/// A single authored metadata fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// Base name of the file the fragment was read from.
    pub file: String,
    /// Logical identifier (`alias` or `name` of the fragment).
    pub name: String,
    /// The fragment itself.
    pub metadata: Value,
}

impl Part {
    pub fn new(file: impl Into<String>, name: impl Into<String>, metadata: Value) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
            metadata,
        }
    }
}

/// Release entry in the generated metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    pub file: String,
    pub version: String,
}

/// Stemcell requirements of the tile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StemcellCriteria {
    pub version: String,
    pub os: String,
    #[serde(default)]
    pub requires_cpi: bool,
}

/// Contents of a release tarball's `release.MF`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ReleaseManifest {
    pub name: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
}

/// Contents of a stemcell tarball's `stemcell.MF`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct StemcellManifest {
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
    pub operating_system: String,
}

/// Accept versions written either as strings or as bare YAML numbers.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a scalar version, found {:?}",
            other
        ))),
    }
}

/// The assembled tile metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneratedMetadata {
    pub name: String,
    pub stemcell_criteria: StemcellCriteria,
    pub releases: Vec<Release>,
    pub icon_image: String,
    pub form_types: Vec<Part>,
    /// Instance groups with their job templates resolved.
    pub job_types: Vec<Part>,
    pub runtime_configs: Vec<Part>,
    pub variables: Vec<Part>,
    /// Passthrough fields from the base metadata.
    pub metadata: Metadata,
}

impl GeneratedMetadata {
    /// Render the metadata document as YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Serializes a list of parts as their metadata only.
struct MetadataOnly<'a>(&'a [Part]);

impl Serialize for MetadataOnly<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|part| &part.metadata))
    }
}

impl Serialize for GeneratedMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("stemcell_criteria", &self.stemcell_criteria)?;
        map.serialize_entry("releases", &self.releases)?;
        map.serialize_entry("icon_image", &self.icon_image)?;

        let sections = [
            ("form_types", &self.form_types),
            ("job_types", &self.job_types),
            ("runtime_configs", &self.runtime_configs),
            ("variables", &self.variables),
        ];
        for (key, parts) in sections {
            if !parts.is_empty() {
                map.serialize_entry(key, &MetadataOnly(parts))?;
            }
        }

        for (key, value) in &self.metadata {
            let generated = key
                .as_str()
                .is_some_and(|k| GENERATED_KEYS.contains(&k));
            if !generated {
                map.serialize_entry(key, value)?;
            }
        }

        map.end()
    }
}
