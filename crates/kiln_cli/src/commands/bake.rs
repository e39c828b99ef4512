//! Bake command - Assemble tile metadata.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use regex::Regex;
use serde_yaml::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use kiln_builder::{interpolate, BuildInput, MetadataBuilder};

use super::UsageError;

#[derive(Args, Debug, Default)]
pub struct BakeArgs {
    /// Path to the metadata file
    #[arg(short, long, env = "KILN_METADATA")]
    metadata: Option<PathBuf>,

    /// Version of the tile
    #[arg(short = 'v', long = "version")]
    product_version: Option<String>,

    /// Path to the icon file
    #[arg(short, long, env = "KILN_ICON")]
    icon: Option<PathBuf>,

    /// Path to a stemcell tarball
    #[arg(long, env = "KILN_STEMCELL_TARBALL")]
    stemcell_tarball: Option<PathBuf>,

    /// Path to a directory containing release tarballs
    #[arg(long = "releases-directory")]
    releases_directories: Vec<PathBuf>,

    /// Path to a directory containing forms
    #[arg(short = 'f', long = "forms-directory")]
    forms_directories: Vec<PathBuf>,

    /// Path to a directory containing instance groups
    #[arg(long = "instance-groups-directory")]
    instance_groups_directories: Vec<PathBuf>,

    /// Path to a directory containing jobs
    #[arg(short = 'j', long = "jobs-directory")]
    jobs_directories: Vec<PathBuf>,

    /// Path to a directory containing runtime configs
    #[arg(long = "runtime-configs-directory")]
    runtime_configs_directories: Vec<PathBuf>,

    /// Path to a directory containing variables
    #[arg(long = "variables-directory")]
    variables_directories: Vec<PathBuf>,

    /// Key value pairs of variables to interpolate
    #[arg(long = "variable", value_name = "KEY=VALUE")]
    variables: Vec<String>,

    /// Path to a YAML file of variables to interpolate
    #[arg(long = "variables-file")]
    variables_files: Vec<PathBuf>,

    /// Path to where the metadata will be written
    #[arg(short, long, env = "KILN_OUTPUT_FILE")]
    output_file: Option<PathBuf>,
}

/// Arguments after validation.
#[derive(Debug)]
struct BakeConfig {
    metadata: PathBuf,
    version: String,
    icon: PathBuf,
    stemcell_tarball: PathBuf,
    output_file: PathBuf,
}

impl BakeArgs {
    fn validate(&self) -> Result<BakeConfig, UsageError> {
        fn required<T: Clone>(value: &Option<T>, message: &str) -> Result<T, UsageError> {
            value.clone().ok_or_else(|| UsageError(message.to_string()))
        }

        if self.releases_directories.is_empty() {
            return Err(UsageError(
                "Please specify release tarballs directory with the --releases-directory parameter"
                    .to_string(),
            ));
        }

        let stemcell_tarball =
            required(&self.stemcell_tarball, "--stemcell-tarball is a required parameter")?;
        let icon = required(&self.icon, "--icon is a required parameter")?;
        let metadata = required(&self.metadata, "--metadata is a required parameter")?;
        let version = required(&self.product_version, "--version is a required parameter")?;
        let output_file = required(&self.output_file, "--output-file is a required parameter")?;

        if !self.jobs_directories.is_empty() && self.instance_groups_directories.is_empty() {
            return Err(UsageError(
                "--jobs-directory flag requires --instance-groups-directory to also be specified"
                    .to_string(),
            ));
        }

        Ok(BakeConfig {
            metadata,
            version,
            icon,
            stemcell_tarball,
            output_file,
        })
    }
}

pub fn execute(args: BakeArgs) -> Result<()> {
    let config = args.validate()?;

    let release_tarballs = find_release_tarballs(&args.releases_directories)?;

    info!("Creating metadata for {}...", config.output_file.display());

    let variables = build_variables(&args.variables_files, &args.variables)?;

    let input = BuildInput {
        metadata_path: config.metadata,
        version: config.version,
        release_tarballs,
        stemcell_tarball: config.stemcell_tarball,
        form_directories: args.forms_directories,
        instance_group_directories: args.instance_groups_directories,
        job_directories: args.jobs_directories,
        runtime_config_directories: args.runtime_configs_directories,
        variable_directories: args.variables_directories,
        icon_path: config.icon,
    };

    let generated = MetadataBuilder::new().build(&input)?;

    info!("Marshaling metadata file...");
    let yaml = generated.to_yaml()?;
    let interpolated = interpolate(&yaml, &variables)?;

    fs::write(&config.output_file, interpolated).with_context(|| {
        format!("failed to write metadata to {}", config.output_file.display())
    })?;

    info!(
        "Wrote metadata for {} to {}",
        generated.name,
        config.output_file.display()
    );
    Ok(())
}

/// Release tarballs directly inside each directory, sorted by file name.
fn find_release_tarballs(directories: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let tarball = Regex::new("tgz$|tar.gz$").unwrap();
    let mut tarballs = Vec::new();

    for directory in directories {
        for entry in WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.with_context(|| {
                format!("failed to read releases directory {}", directory.display())
            })?;

            if entry.file_type().is_file()
                && tarball.is_match(&entry.file_name().to_string_lossy())
            {
                tarballs.push(entry.into_path());
            }
        }
    }

    debug!("Found {} release tarballs", tarballs.len());
    Ok(tarballs)
}

/// Merge variables files in order, then `key=value` flags on top.
fn build_variables(files: &[PathBuf], pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut variables = HashMap::new();

    for file in files {
        variables.extend(read_variables_file(file)?);
    }

    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(UsageError(
                "variable needs a key value in the form of key=value".to_string(),
            )
            .into());
        };
        variables.insert(key.to_string(), value.to_string());
    }

    Ok(variables)
}

fn read_variables_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read variables file {}", path.display()))?;
    let document: HashMap<String, Value> = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse variables file {}", path.display()))?;

    document
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => anyhow::bail!(
                    "variable {:?} in {} must be a scalar",
                    key,
                    path.display()
                ),
            };
            Ok((key, value))
        })
        .collect()
}
