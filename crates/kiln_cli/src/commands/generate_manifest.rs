//! Generate-manifest command - Render a deployment manifest.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use kiln_cargo::{EnvironmentConfig, Generator, ProductTemplate};

#[derive(Args, Debug)]
pub struct GenerateManifestArgs {
    /// Path to the tile metadata
    #[arg(short, long, env = "KILN_TEMPLATE")]
    template: PathBuf,

    /// Path to the environment config (.json, .yml or .yaml)
    #[arg(short, long, env = "KILN_CONFIG")]
    config: PathBuf,

    /// Write the manifest here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn execute(args: GenerateManifestArgs) -> Result<()> {
    let template = ProductTemplate::load(&args.template)
        .with_context(|| format!("failed to load tile metadata {}", args.template.display()))?;
    let config = EnvironmentConfig::load(&args.config)
        .with_context(|| format!("failed to load environment config {}", args.config.display()))?;

    let manifest = Generator::new().execute(&template, &config);
    let yaml = manifest.to_yaml()?;

    match &args.output {
        Some(path) => {
            fs::write(path, yaml)
                .with_context(|| format!("failed to write manifest to {}", path.display()))?;
            info!("Wrote manifest for {} to {}", manifest.name, path.display());
        }
        None => print!("{}", yaml),
    }

    Ok(())
}
