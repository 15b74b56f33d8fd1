//! # portico CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use std::process::ExitCode;

use clap::Parser;

/// Portico — service front-end composition.
///
/// Synthesizes provisioning plans for a throttled API front end: resource
/// tree, method integrations, deployment stages, per-tier keys and usage
/// plans, and invoke grants.
#[derive(Parser, Debug)]
#[command(name = "portico", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Compose a provisioning plan from an application spec.
    Synth(portico_cli::synth::SynthArgs),
    /// Validate an application spec without producing a plan.
    Validate(portico_cli::validate::ValidateArgs),
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Synth(args) => portico_cli::synth::run_synth(&args),
        Commands::Validate(args) => portico_cli::validate::run_validate(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
