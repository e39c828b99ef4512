//! Deployment manifest generation.

use tracing::debug;

use crate::environment::EnvironmentConfig;
use crate::manifest::{
    InstanceGroup, Lifecycle, Manifest, ManifestRelease, ManifestStemcell, ManifestVariable,
    Update,
};
use crate::template::{JobType, ProductTemplate};

/// Resolves a [`ProductTemplate`] against an [`EnvironmentConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Generator;

impl Generator {
    pub fn new() -> Self {
        Self
    }

    /// Build the manifest. Never fails: unmatched lookups fall back to defaults.
    pub fn execute(&self, template: &ProductTemplate, config: &EnvironmentConfig) -> Manifest {
        let releases = template
            .releases
            .iter()
            .map(|release| ManifestRelease {
                name: release.name.clone(),
                version: release.version.clone(),
            })
            .collect();

        let stemcell = select_stemcell(template, config);
        debug!(
            "Selected stemcell alias {:?} for {} {}",
            stemcell.alias, template.stemcell_criteria.os, template.stemcell_criteria.version
        );

        let update = Update {
            serial: template.serial,
            ..Update::default()
        };

        let instance_groups = template
            .job_types
            .iter()
            .map(|job_type| InstanceGroup {
                name: job_type.name.clone(),
                azs: config.availability_zones.clone(),
                lifecycle: if job_type.errand {
                    Lifecycle::Errand
                } else {
                    Lifecycle::Service
                },
                stemcell: stemcell.alias.clone(),
                instances: instance_count(job_type, config),
            })
            .collect();

        let variables = template
            .variables
            .iter()
            .map(|variable| ManifestVariable {
                name: variable.name.clone(),
                kind: variable.kind.clone(),
                options: variable.options.clone(),
            })
            .collect();

        Manifest {
            name: config.deployment_name.clone(),
            releases,
            stemcells: vec![stemcell],
            update,
            variables,
            instance_groups,
        }
    }
}

/// The last uploaded stemcell matching both os and version, or an empty one.
fn select_stemcell(template: &ProductTemplate, config: &EnvironmentConfig) -> ManifestStemcell {
    let criteria = &template.stemcell_criteria;

    config
        .stemcells
        .iter()
        .rev()
        .find(|stemcell| stemcell.os == criteria.os && stemcell.version == criteria.version)
        .map(|stemcell| ManifestStemcell {
            alias: stemcell.name.clone(),
            os: stemcell.os.clone(),
            version: stemcell.version.clone(),
        })
        .unwrap_or_default()
}

/// The last concrete resource override for the group, else the tile default.
fn instance_count(job_type: &JobType, config: &EnvironmentConfig) -> i64 {
    config
        .resource_configs
        .iter()
        .filter(|resource| resource.name == job_type.name)
        .filter_map(|resource| resource.instances.value())
        .last()
        .unwrap_or(job_type.instance_definition.default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{AvailableStemcell, Instances, ResourceConfig};
    use crate::template::{InstanceDefinition, TemplateStemcellCriteria};

    fn job_type(name: &str, default: i64) -> JobType {
        JobType {
            name: name.to_string(),
            errand: false,
            instance_definition: InstanceDefinition { default },
        }
    }

    fn stemcell(name: &str, os: &str, version: &str) -> AvailableStemcell {
        AvailableStemcell {
            name: name.to_string(),
            os: os.to_string(),
            version: version.to_string(),
        }
    }

    fn template() -> ProductTemplate {
        ProductTemplate {
            stemcell_criteria: TemplateStemcellCriteria {
                os: "ubuntu-trusty".to_string(),
                version: "3586.25".to_string(),
            },
            job_types: vec![job_type("router", 3)],
            ..Default::default()
        }
    }

    #[test]
    fn test_last_matching_stemcell_wins() {
        let config = EnvironmentConfig {
            stemcells: vec![
                stemcell("first", "ubuntu-trusty", "3586.25"),
                stemcell("other-os", "windows2016", "3586.25"),
                stemcell("second", "ubuntu-trusty", "3586.25"),
                stemcell("other-version", "ubuntu-trusty", "3541.1"),
            ],
            ..Default::default()
        };

        let manifest = Generator::new().execute(&template(), &config);
        assert_eq!(manifest.stemcells.len(), 1);
        assert_eq!(manifest.stemcells[0].alias, "second");
        assert_eq!(manifest.instance_groups[0].stemcell, "second");
    }

    #[test]
    fn test_no_matching_stemcell_yields_placeholder() {
        let config = EnvironmentConfig {
            stemcells: vec![stemcell("default", "ubuntu-xenial", "97.1")],
            ..Default::default()
        };

        let manifest = Generator::new().execute(&template(), &config);
        assert_eq!(manifest.stemcells, vec![ManifestStemcell::default()]);
        assert_eq!(manifest.instance_groups[0].stemcell, "");
    }

    #[test]
    fn test_resource_config_overrides() {
        let config = EnvironmentConfig {
            resource_configs: vec![
                ResourceConfig {
                    name: "router".to_string(),
                    instances: Instances::Count(5),
                },
                ResourceConfig {
                    name: "router".to_string(),
                    instances: Instances::Count(7),
                },
                ResourceConfig {
                    name: "router".to_string(),
                    instances: Instances::automatic(),
                },
            ],
            ..Default::default()
        };

        let manifest = Generator::new().execute(&template(), &config);
        assert_eq!(manifest.instance_groups[0].instances, 7);
    }

    #[test]
    fn test_automatic_keeps_default() {
        let config = EnvironmentConfig {
            resource_configs: vec![ResourceConfig {
                name: "router".to_string(),
                instances: Instances::automatic(),
            }],
            ..Default::default()
        };

        let manifest = Generator::new().execute(&template(), &config);
        assert_eq!(manifest.instance_groups[0].instances, 3);
    }
}
