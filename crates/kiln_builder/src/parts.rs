//! Directory reader for metadata parts.
//!
//! A parts directory holds one YAML file per form, job, instance group,
//! runtime config or variable. Files may instead group several parts under a
//! top-level key, and an `_order.yml` file may pin the order of the result.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_yaml::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{BuilderError, BuilderResult};
use crate::models::Part;
use crate::reader::PartsReader;

/// Name of the file that fixes the order of parts within a directory.
pub const ORDER_FILE: &str = "_order.yml";

/// Reads metadata parts from every YAML file below a directory.
#[derive(Debug, Clone, Default)]
pub struct PartsDirectoryReader {
    top_level_key: Option<String>,
    order_key: Option<String>,
}

impl PartsDirectoryReader {
    /// One part per file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Each file holds a list of parts under `key`.
    pub fn with_top_level_key(mut self, key: impl Into<String>) -> Self {
        self.top_level_key = Some(key.into());
        self
    }

    /// Order parts by the `key` list of the directory's `_order.yml`, when present.
    pub fn with_order_key(mut self, key: impl Into<String>) -> Self {
        self.order_key = Some(key.into());
        self
    }

    fn read_file(&self, path: &Path) -> BuilderResult<Vec<Part>> {
        debug!("Reading metadata part from {:?}", path);

        let content = fs::read_to_string(path)?;
        let value: Value =
            serde_yaml::from_str(&content).map_err(|source| BuilderError::Unmarshal {
                path: path.display().to_string(),
                source,
            })?;

        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match &self.top_level_key {
            Some(key) => {
                let items = value
                    .as_mapping()
                    .and_then(|doc| doc.get(key.as_str()))
                    .and_then(Value::as_sequence)
                    .ok_or_else(|| BuilderError::PartsNotFound(path.display().to_string()))?;

                items
                    .iter()
                    .cloned()
                    .map(|item| build_part(item, &file))
                    .collect()
            }
            None => Ok(vec![build_part(value, &file)?]),
        }
    }
}

impl PartsReader for PartsDirectoryReader {
    fn read(&self, path: &Path) -> BuilderResult<Vec<Part>> {
        let mut parts = Vec::new();

        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() || !is_part_file(entry.path()) {
                continue;
            }
            parts.extend(self.read_file(entry.path())?);
        }

        match &self.order_key {
            Some(key) => order_parts(path, key, parts),
            None => Ok(parts),
        }
    }
}

fn is_part_file(path: &Path) -> bool {
    let yaml = path
        .extension()
        .is_some_and(|ext| ext == "yml" || ext == "yaml");
    let order_file = path.file_name().is_some_and(|name| name == ORDER_FILE);
    yaml && !order_file
}

/// Turn one YAML item into a part; `alias` takes precedence over `name`.
fn build_part(metadata: Value, file: &str) -> BuilderResult<Part> {
    let mut doc = match metadata {
        Value::Mapping(doc) => doc,
        other => return Err(BuilderError::PartNotAMap(describe(&other))),
    };

    let alias = doc.shift_remove("alias");
    let name = match alias.as_ref().and_then(Value::as_str) {
        Some(alias) => alias.to_string(),
        None => match doc.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => return Err(BuilderError::PartMissingName(describe(&Value::Mapping(doc)))),
        },
    };

    Ok(Part::new(file, name, Value::Mapping(doc)))
}

fn order_parts(dir: &Path, key: &str, parts: Vec<Part>) -> BuilderResult<Vec<Part>> {
    let order_path = dir.join(ORDER_FILE);
    if !order_path.is_file() {
        return Ok(parts);
    }

    debug!("Ordering parts using {:?}", order_path);
    let content = fs::read_to_string(&order_path)?;
    let order: Value = serde_yaml::from_str(&content).map_err(|source| BuilderError::Unmarshal {
        path: order_path.display().to_string(),
        source,
    })?;

    let names = order
        .get(key)
        .and_then(Value::as_sequence)
        .ok_or_else(|| BuilderError::PartsNotFound(order_path.display().to_string()))?;

    let index: HashMap<&str, &Part> = parts.iter().map(|p| (p.name.as_str(), p)).collect();

    names
        .iter()
        .map(|entry| {
            let name = entry.as_str().map(str::to_string).unwrap_or_else(|| describe(entry));
            index
                .get(name.as_str())
                .map(|part| (*part).clone())
                .ok_or_else(|| BuilderError::OrderedPartMissing {
                    name,
                    dir: dir.to_path_buf(),
                })
        })
        .collect()
}

fn describe(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_reads_one_part_per_file() {
        let temp = tempdir().unwrap();
        write(temp.path(), "b-job.yml", "name: b-job\nrelease: b-release\n");
        write(temp.path(), "a-job.yml", "name: a-job\nrelease: a-release\n");
        write(temp.path(), "notes.txt", "not a part");

        let parts = PartsDirectoryReader::new().read(temp.path()).unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "a-job");
        assert_eq!(parts[0].file, "a-job.yml");
        assert_eq!(parts[1].name, "b-job");
        assert_eq!(parts[1].metadata["release"], Value::from("b-release"));
    }

    #[test]
    fn test_reads_nested_directories() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        write(&temp.path().join("nested"), "deep.yaml", "name: deep\n");

        let parts = PartsDirectoryReader::new().read(temp.path()).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].file, "deep.yaml");
    }

    #[test]
    fn test_top_level_key_with_alias() {
        let temp = tempdir().unwrap();
        write(
            temp.path(),
            "variables.yml",
            "variables:\n- name: variable-1\n  type: certificate\n- alias: variable-2\n  name: shared\n  type: user\n",
        );

        let parts = PartsDirectoryReader::new()
            .with_top_level_key("variables")
            .read(temp.path())
            .unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "variable-1");
        assert_eq!(parts[1].name, "variable-2");
        assert!(parts[1].metadata.get("alias").is_none());
        assert_eq!(parts[1].metadata["name"], Value::from("shared"));
    }

    #[test]
    fn test_top_level_key_missing() {
        let temp = tempdir().unwrap();
        write(temp.path(), "runtime.yml", "name: lonely\n");

        let err = PartsDirectoryReader::new()
            .with_top_level_key("runtime_configs")
            .read(temp.path())
            .unwrap_err();
        assert!(err.to_string().starts_with("metadata parts not found in file"));
    }

    #[test]
    fn test_part_without_name() {
        let temp = tempdir().unwrap();
        write(temp.path(), "form.yml", "label: Some Form\n");

        let err = PartsDirectoryReader::new().read(temp.path()).unwrap_err();
        assert!(err.to_string().contains("does not have a `name` field"));
    }

    #[test]
    fn test_part_not_a_map() {
        let temp = tempdir().unwrap();
        write(temp.path(), "form.yml", "- just\n- a\n- list\n");

        let err = PartsDirectoryReader::new().read(temp.path()).unwrap_err();
        assert!(err.to_string().contains("must be a map"));
    }

    #[test]
    fn test_invalid_yaml() {
        let temp = tempdir().unwrap();
        write(temp.path(), "broken.yml", "name: [unterminated\n");

        let err = PartsDirectoryReader::new().read(temp.path()).unwrap_err();
        assert!(err.to_string().starts_with("cannot unmarshal '"));
    }

    #[test]
    fn test_order_file() {
        let temp = tempdir().unwrap();
        write(temp.path(), "first.yml", "name: first\n");
        write(temp.path(), "second.yml", "name: second\n");
        write(temp.path(), ORDER_FILE, "forms:\n- second\n- first\n");

        let parts = PartsDirectoryReader::new()
            .with_order_key("forms")
            .read(temp.path())
            .unwrap();

        let names: Vec<_> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[test]
    fn test_order_file_names_missing_part() {
        let temp = tempdir().unwrap();
        write(temp.path(), "first.yml", "name: first\n");
        write(temp.path(), ORDER_FILE, "forms:\n- first\n- ghost\n");

        let err = PartsDirectoryReader::new()
            .with_order_key("forms")
            .read(temp.path())
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("file specified in _order.yml \"ghost\" does not exist in"));
    }

    #[test]
    fn test_missing_directory() {
        let temp = tempdir().unwrap();
        let result = PartsDirectoryReader::new().read(&temp.path().join("absent"));
        assert!(matches!(result, Err(BuilderError::Io(_))));
    }
}
