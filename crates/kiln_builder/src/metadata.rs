//! Base metadata and icon readers.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_yaml::Value;
use tracing::debug;

use crate::error::{BuilderError, BuilderResult};
use crate::models::Metadata;
use crate::reader::{IconEncoder, MetadataReader};

/// Reads the base tile metadata file and stamps it with the tile version.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataFileReader;

impl MetadataReader for MetadataFileReader {
    fn read(&self, path: &Path, version: &str) -> BuilderResult<Metadata> {
        debug!("Reading tile metadata from {:?}", path);

        let content = fs::read_to_string(path)?;
        let value: Value =
            serde_yaml::from_str(&content).map_err(|source| BuilderError::Unmarshal {
                path: path.display().to_string(),
                source,
            })?;

        let mut metadata = match value {
            Value::Mapping(metadata) => metadata,
            // an empty file parses as null
            Value::Null => Metadata::new(),
            _ => return Err(BuilderError::MetadataNotAMap(path.to_path_buf())),
        };

        if !version.is_empty() {
            metadata.insert("product_version".into(), version.into());
        }

        Ok(metadata)
    }
}

/// Encodes the icon file as standard base64.
#[derive(Debug, Default, Clone, Copy)]
pub struct Base64IconEncoder;

impl IconEncoder for Base64IconEncoder {
    fn encode(&self, path: &Path) -> BuilderResult<String> {
        debug!("Encoding icon {:?}", path);
        let bytes = fs::read(path)?;
        Ok(STANDARD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_metadata_sets_product_version() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("metadata.yml");
        fs::write(&path, "name: cool-product\nmetadata_version: '1.7'\n").unwrap();

        let metadata = MetadataFileReader.read(&path, "1.2.3").unwrap();
        assert_eq!(metadata.get("name"), Some(&Value::from("cool-product")));
        assert_eq!(metadata.get("product_version"), Some(&Value::from("1.2.3")));
    }

    #[test]
    fn test_read_metadata_rejects_lists() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("metadata.yml");
        fs::write(&path, "- name: cool-product\n").unwrap();

        let result = MetadataFileReader.read(&path, "1.2.3");
        assert!(matches!(result, Err(BuilderError::MetadataNotAMap(_))));
    }

    #[test]
    fn test_encode_icon() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("icon.png");
        fs::write(&path, b"icon").unwrap();

        assert_eq!(Base64IconEncoder.encode(&path).unwrap(), "aWNvbg==");
    }

    #[test]
    fn test_encode_missing_icon() {
        let temp = tempdir().unwrap();
        let result = Base64IconEncoder.encode(&temp.path().join("missing.png"));
        assert!(matches!(result, Err(BuilderError::Io(_))));
    }
}
