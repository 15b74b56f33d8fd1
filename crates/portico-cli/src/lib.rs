//! # portico-cli — Portico Command-Line Interface
//!
//! Drives composition from YAML application specs.
//!
//! ## Subcommands
//!
//! - `synth` — compose the front end, seal the plan, print a summary,
//!   optionally write the plan artifact as JSON or YAML
//! - `validate` — validate the spec and dry-run composition; exit 1 on
//!   invalid input with every violation listed
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handler functions delegate to `portico-compose` and `portico-plan` —
//!   no composition logic here.

pub mod app_spec;
pub mod synth;
pub mod validate;
