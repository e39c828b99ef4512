//! CLI command definitions.

use clap::{Parser, Subcommand};
use thiserror::Error;

pub mod bake;
pub mod generate_manifest;

/// kiln - tile metadata baker
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(version, about = "kiln - bakes tile metadata and generates deployment manifests")]
#[command(long_about = r#"
kiln assembles a tile's metadata from directories of YAML fragments, release
and stemcell tarballs, and renders deployment manifests from tile metadata.

COMMANDS:
  bake               → Assemble, interpolate and write tile metadata
  generate-manifest  → Render a deployment manifest for an environment

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Template error
"#)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble tile metadata from its parts
    Bake(bake::BakeArgs),

    /// Generate a deployment manifest from tile metadata and environment state
    #[command(name = "generate-manifest")]
    GenerateManifest(generate_manifest::GenerateManifestArgs),
}

/// Invalid or missing command-line input.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct UsageError(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_manifest() {
        let cli = Cli::try_parse_from([
            "kiln",
            "--verbose",
            "generate-manifest",
            "--template",
            "metadata.yml",
            "--config",
            "env.json",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::GenerateManifest(_)));
    }
}
