//! Metadata assembly.
//!
//! [`MetadataBuilder`] reads every fragment of a tile in a fixed order, resolves
//! the job templates referenced by instance groups and merges the result with
//! the base metadata into a single [`GeneratedMetadata`]. The first failure
//! aborts the build; no partial metadata is ever returned.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use crate::archive::{ReleaseTarballReader, StemcellTarballReader};
use crate::error::{BuilderError, BuilderResult};
use crate::metadata::{Base64IconEncoder, MetadataFileReader};
use crate::models::{GeneratedMetadata, Metadata, Part, Release, StemcellCriteria, GENERATED_KEYS};
use crate::parts::PartsDirectoryReader;
use crate::reader::{
    IconEncoder, Logger, MetadataReader, PartsReader, ReleaseManifestReader,
    StemcellManifestReader, TracingLogger,
};

/// Everything needed to assemble a tile's metadata.
#[derive(Debug, Clone, Default)]
pub struct BuildInput {
    pub metadata_path: PathBuf,
    /// Tile version, stamped into the base metadata.
    pub version: String,
    pub release_tarballs: Vec<PathBuf>,
    pub stemcell_tarball: PathBuf,
    pub form_directories: Vec<PathBuf>,
    pub instance_group_directories: Vec<PathBuf>,
    pub job_directories: Vec<PathBuf>,
    pub runtime_config_directories: Vec<PathBuf>,
    pub variable_directories: Vec<PathBuf>,
    pub icon_path: PathBuf,
}

/// Kinds of directory-sourced parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartKind {
    RuntimeConfigs,
    Variables,
    Forms,
    InstanceGroups,
    Jobs,
}

impl PartKind {
    /// Noun used in progress lines.
    fn label(&self) -> &'static str {
        match self {
            PartKind::RuntimeConfigs => "runtime configs",
            PartKind::Variables => "variables",
            PartKind::Forms => "forms",
            PartKind::InstanceGroups => "instance groups",
            PartKind::Jobs => "jobs",
        }
    }

    /// Directory kind used in read errors.
    fn directory_kind(&self) -> &'static str {
        match self {
            PartKind::RuntimeConfigs => "runtime configs",
            PartKind::Variables => "variables",
            PartKind::Forms => "form",
            PartKind::InstanceGroups => "instance group",
            PartKind::Jobs => "job",
        }
    }
}

/// Assembles tile metadata from its parts.
pub struct MetadataBuilder {
    forms_reader: Box<dyn PartsReader>,
    instance_groups_reader: Box<dyn PartsReader>,
    jobs_reader: Box<dyn PartsReader>,
    runtime_configs_reader: Box<dyn PartsReader>,
    variables_reader: Box<dyn PartsReader>,
    release_reader: Box<dyn ReleaseManifestReader>,
    stemcell_reader: Box<dyn StemcellManifestReader>,
    metadata_reader: Box<dyn MetadataReader>,
    icon_encoder: Box<dyn IconEncoder>,
    logger: Box<dyn Logger>,
}

impl Default for MetadataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataBuilder {
    /// Create a builder backed by the filesystem readers.
    pub fn new() -> Self {
        Self {
            forms_reader: Box::new(PartsDirectoryReader::new().with_order_key("forms")),
            instance_groups_reader: Box::new(PartsDirectoryReader::new()),
            jobs_reader: Box::new(PartsDirectoryReader::new()),
            runtime_configs_reader: Box::new(
                PartsDirectoryReader::new().with_top_level_key("runtime_configs"),
            ),
            variables_reader: Box::new(PartsDirectoryReader::new().with_top_level_key("variables")),
            release_reader: Box::new(ReleaseTarballReader),
            stemcell_reader: Box::new(StemcellTarballReader),
            metadata_reader: Box::new(MetadataFileReader),
            icon_encoder: Box::new(Base64IconEncoder),
            logger: Box::new(TracingLogger),
        }
    }

    pub fn with_forms_reader(mut self, reader: impl PartsReader + 'static) -> Self {
        self.forms_reader = Box::new(reader);
        self
    }

    pub fn with_instance_groups_reader(mut self, reader: impl PartsReader + 'static) -> Self {
        self.instance_groups_reader = Box::new(reader);
        self
    }

    pub fn with_jobs_reader(mut self, reader: impl PartsReader + 'static) -> Self {
        self.jobs_reader = Box::new(reader);
        self
    }

    pub fn with_runtime_configs_reader(mut self, reader: impl PartsReader + 'static) -> Self {
        self.runtime_configs_reader = Box::new(reader);
        self
    }

    pub fn with_variables_reader(mut self, reader: impl PartsReader + 'static) -> Self {
        self.variables_reader = Box::new(reader);
        self
    }

    pub fn with_release_reader(mut self, reader: impl ReleaseManifestReader + 'static) -> Self {
        self.release_reader = Box::new(reader);
        self
    }

    pub fn with_stemcell_reader(mut self, reader: impl StemcellManifestReader + 'static) -> Self {
        self.stemcell_reader = Box::new(reader);
        self
    }

    pub fn with_metadata_reader(mut self, reader: impl MetadataReader + 'static) -> Self {
        self.metadata_reader = Box::new(reader);
        self
    }

    pub fn with_icon_encoder(mut self, encoder: impl IconEncoder + 'static) -> Self {
        self.icon_encoder = Box::new(encoder);
        self
    }

    pub fn with_logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Box::new(logger);
        self
    }

    /// Assemble the tile metadata.
    pub fn build(&self, input: &BuildInput) -> BuilderResult<GeneratedMetadata> {
        let releases = self.read_releases(&input.release_tarballs)?;

        let runtime_configs = self.read_parts(
            self.runtime_configs_reader.as_ref(),
            &input.runtime_config_directories,
            PartKind::RuntimeConfigs,
        )?;
        let variables = self.read_parts(
            self.variables_reader.as_ref(),
            &input.variable_directories,
            PartKind::Variables,
        )?;
        let form_types = self.read_parts(
            self.forms_reader.as_ref(),
            &input.form_directories,
            PartKind::Forms,
        )?;
        let instance_groups = self.read_parts(
            self.instance_groups_reader.as_ref(),
            &input.instance_group_directories,
            PartKind::InstanceGroups,
        )?;
        let jobs = self.read_parts(
            self.jobs_reader.as_ref(),
            &input.job_directories,
            PartKind::Jobs,
        )?;

        let job_types = resolve_job_references(instance_groups, &jobs)?;

        let stemcell = self.stemcell_reader.read(&input.stemcell_tarball)?;
        self.logger.log(&format!(
            "Read manifest for stemcell version {}",
            stemcell.version
        ));

        let mut metadata = self
            .metadata_reader
            .read(&input.metadata_path, &input.version)?;
        self.logger.log("Read metadata");

        let name = validate_metadata(&metadata)?;
        let requires_cpi = metadata
            .get("stemcell_criteria")
            .and_then(|criteria| criteria.get("requires_cpi"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        for key in GENERATED_KEYS {
            metadata.shift_remove(*key);
        }

        let icon_image = self.icon_encoder.encode(&input.icon_path)?;

        Ok(GeneratedMetadata {
            name,
            stemcell_criteria: StemcellCriteria {
                version: stemcell.version,
                os: stemcell.operating_system,
                requires_cpi,
            },
            releases,
            icon_image,
            form_types,
            job_types,
            runtime_configs,
            variables,
            metadata,
        })
    }

    fn read_releases(&self, tarballs: &[PathBuf]) -> BuilderResult<Vec<Release>> {
        let mut releases = Vec::with_capacity(tarballs.len());

        for tarball in tarballs {
            let manifest = self.release_reader.read(tarball)?;
            self.logger
                .log(&format!("Read manifest for release {}", manifest.name));

            releases.push(Release {
                name: manifest.name,
                file: base_name(tarball),
                version: manifest.version,
            });
        }

        Ok(releases)
    }

    fn read_parts(
        &self,
        reader: &dyn PartsReader,
        directories: &[PathBuf],
        kind: PartKind,
    ) -> BuilderResult<Vec<Part>> {
        let mut parts = Vec::new();

        for directory in directories {
            let read = reader
                .read(directory)
                .map_err(|source| BuilderError::DirectoryRead {
                    kind: kind.directory_kind(),
                    path: directory.clone(),
                    source: Box::new(source),
                })?;
            self.logger.log(&format!(
                "Read {} from {}",
                kind.label(),
                directory.display()
            ));

            debug!("Read {} {} from {:?}", read.len(), kind.label(), directory);
            parts.extend(read);
        }

        Ok(parts)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Check the base metadata and return the tile name.
fn validate_metadata(metadata: &Metadata) -> BuilderResult<String> {
    let name = match metadata.get("name") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        _ => return Err(BuilderError::MissingName),
    };

    if metadata.contains_key("runtime_configs") {
        return Err(BuilderError::RuntimeConfigsInMetadata);
    }

    if metadata.contains_key("variables") {
        return Err(BuilderError::VariablesInMetadata);
    }

    Ok(name)
}

/// Replace the job names listed under each instance group's `templates` with
/// the full metadata of the matching job.
fn resolve_job_references(instance_groups: Vec<Part>, jobs: &[Part]) -> BuilderResult<Vec<Part>> {
    // File names are indexed first so a job's name wins over another job's file.
    let mut index: HashMap<&str, &Part> = HashMap::with_capacity(jobs.len() * 2);
    for job in jobs {
        index.insert(job.file.as_str(), job);
    }
    for job in jobs {
        index.insert(job.name.as_str(), job);
    }

    instance_groups
        .into_iter()
        .map(|mut group| {
            resolve_templates(&group.name, &mut group.metadata, &index)?;
            Ok(group)
        })
        .collect()
}

fn resolve_templates(
    group: &str,
    metadata: &mut Value,
    index: &HashMap<&str, &Part>,
) -> BuilderResult<()> {
    let Some(templates) = metadata.get_mut("templates") else {
        return Ok(());
    };
    let Some(entries) = templates.as_sequence_mut() else {
        return Err(BuilderError::InvalidTemplates(group.to_string()));
    };

    for entry in entries.iter_mut() {
        // Entries that are already maps are inline job definitions.
        let Some(job_name) = entry.as_str() else {
            continue;
        };

        let job = index
            .get(job_name)
            .ok_or_else(|| BuilderError::MissingJob {
                group: group.to_string(),
                job: job_name.to_string(),
            })?;
        *entry = job.metadata.clone();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(file: &str, name: &str, yaml: &str) -> Part {
        Part::new(file, name, serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_resolve_job_references_by_name_and_file() {
        let jobs = vec![
            part("some-job-1.yml", "some-job-1", "name: some-job-1\nrelease: r1\n"),
            part("some-job-2.yml", "some-job-2", "name: some-job-2\nrelease: r2\n"),
        ];
        let groups = vec![part(
            "ig.yml",
            "ig",
            "name: ig\ntemplates:\n- some-job-1\n- some-job-2.yml\n",
        )];

        let resolved = resolve_job_references(groups, &jobs).unwrap();
        let templates = resolved[0].metadata["templates"].as_sequence().unwrap();
        assert_eq!(templates[0], jobs[0].metadata);
        assert_eq!(templates[1], jobs[1].metadata);
    }

    #[test]
    fn test_resolve_missing_job() {
        let groups = vec![part("ig.yml", "ig", "name: ig\ntemplates:\n- ghost\n")];

        let err = resolve_job_references(groups, &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"instance group "ig" references non-existent job "ghost""#
        );
    }

    #[test]
    fn test_resolve_without_templates() {
        let groups = vec![part("ig.yml", "ig", "name: ig\nlabel: Lonely\n")];
        let resolved = resolve_job_references(groups.clone(), &[]).unwrap();
        assert_eq!(resolved, groups);
    }

    #[test]
    fn test_resolve_malformed_templates() {
        let groups = vec![part("ig.yml", "ig", "name: ig\ntemplates: some-job\n")];
        let result = resolve_job_references(groups, &[]);
        assert!(matches!(result, Err(BuilderError::InvalidTemplates(_))));
    }

    #[test]
    fn test_validate_metadata_empty_name() {
        let metadata: Metadata = serde_yaml::from_str("name: ''\n").unwrap();
        assert!(matches!(
            validate_metadata(&metadata),
            Err(BuilderError::MissingName)
        ));
    }
}
