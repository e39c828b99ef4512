//! kiln CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Template error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kiln_builder::{BuilderError, InterpolationError};

mod commands;

use commands::{Cli, Commands, UsageError};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "kiln=debug"
    } else if cli.quiet {
        "kiln=warn"
    } else {
        "kiln=info"
    };

    // Already initialized is fine.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive(level.parse().unwrap())
                .add_directive("warn".parse().unwrap()),
        )
        .try_init();

    let result = match cli.command {
        Commands::Bake(args) => commands::bake::execute(args),
        Commands::GenerateManifest(args) => commands::generate_manifest::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Map an error to its exit code by the first recognised cause in the chain.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if cause.is::<UsageError>() {
            return ExitCodes::INVALID_ARGS;
        }
        if cause.is::<InterpolationError>() {
            return ExitCodes::TEMPLATE_ERROR;
        }
        if let Some(error) = cause.downcast_ref::<BuilderError>() {
            return match error {
                BuilderError::MissingName
                | BuilderError::RuntimeConfigsInMetadata
                | BuilderError::VariablesInMetadata
                | BuilderError::MissingJob { .. }
                | BuilderError::InvalidTemplates(_) => ExitCodes::VALIDATION_FAILURE,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
    }

    ExitCodes::GENERAL_ERROR
}
