//! # Validate Subcommand
//!
//! Loads an application spec, validates the composition input, and
//! dry-runs the full composition against a throwaway backend. The dry run
//! catches what table validation cannot, such as a declared operation with
//! no handler mapping. Exit code 1 on invalid input.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use portico_compose::{compose_frontend, compose_support};
use portico_core::config::validate_frontend_config;
use portico_plan::memory::PlanBackend;

use crate::app_spec::AppSpec;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the application spec YAML file.
    #[arg(long)]
    pub app: PathBuf,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let spec = AppSpec::load(&args.app)?;
    let config = spec.frontend_config();

    if let Err(violations) = validate_frontend_config(&config) {
        eprintln!("  configuration: INVALID");
        for violation in &violations {
            eprintln!("    - {violation}");
        }
        return Ok(1);
    }

    let mut backend = PlanBackend::new();
    if let Err(err) = compose_frontend(&mut backend, &config, &spec.handlers) {
        eprintln!("  configuration: INVALID");
        eprintln!("    - {err}");
        return Ok(1);
    }
    if let Some(support) = &spec.support {
        if let Err(err) = compose_support(&mut backend, support) {
            eprintln!("  configuration: INVALID");
            eprintln!("    - {err}");
            return Ok(1);
        }
    }

    println!("  configuration: VALID");
    println!("  operations:    {}", config.service.operations.len());
    println!("  tiers:         {}", config.tiers.len());
    Ok(0)
}
