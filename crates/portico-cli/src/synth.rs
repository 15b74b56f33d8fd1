//! # Synth Subcommand
//!
//! Composes the full front end from an application spec, seals the plan,
//! prints a summary, and optionally writes the serialized plan artifact.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use portico_compose::{compose_frontend, compose_support};
use portico_plan::memory::PlanBackend;
use portico_plan::plan::ProvisioningPlan;

use crate::app_spec::AppSpec;

/// Arguments for the synth subcommand.
#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Path to the application spec YAML file.
    #[arg(long)]
    pub app: PathBuf,

    /// Write the serialized plan to this path.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Serialization format for --out.
    #[arg(long, value_enum, default_value_t = PlanFormat::Json)]
    pub format: PlanFormat,
}

/// Plan artifact serialization format.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PlanFormat {
    Json,
    Yaml,
}

/// Execute the synth subcommand.
pub fn run_synth(args: &SynthArgs) -> Result<u8> {
    let spec = AppSpec::load(&args.app)?;
    let config = spec.frontend_config();

    let mut backend = PlanBackend::new();
    compose_frontend(&mut backend, &config, &spec.handlers)?;
    if let Some(support) = &spec.support {
        compose_support(&mut backend, support)?;
    }
    let plan = backend.finish()?;

    print_summary(&plan);

    if let Some(out) = &args.out {
        let serialized = match args.format {
            PlanFormat::Json => serde_json::to_string_pretty(&plan)?,
            PlanFormat::Yaml => serde_yaml::to_string(&plan)?,
        };
        std::fs::write(out, serialized)
            .with_context(|| format!("writing plan: {}", out.display()))?;
        println!("  wrote:       {}", out.display());
    }

    Ok(0)
}

fn print_summary(plan: &ProvisioningPlan) {
    println!("  plan:        {} node(s)", plan.len());
    println!("  build order: {} node(s)", plan.build_order().len());
    println!("  digest:      {}", plan.digest());
    for (api, stage) in plan.active_stages() {
        println!("  active:      {api} -> {stage}");
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for node in plan.nodes() {
        *counts.entry(node.kind.as_str()).or_insert(0) += 1;
    }
    for (kind, count) in counts {
        println!("    {count:>3} {kind}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SPEC: &str = "\
handlers:
  listSomeResources: \"handler://some-service/list-some-resources\"
support:
  queue_name: work
  visibility_timeout_secs: 300
  topic_name: events
  task_flow_name: callbacks
  task_handler: \"handler://portico/callbacks\"
  completion_timeout_secs: 3600
";

    fn write_spec(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn synth_writes_a_plan_that_parses_back() {
        let spec = write_spec(SPEC);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plan.json");

        let code = run_synth(&SynthArgs {
            app: spec.path().to_path_buf(),
            out: Some(out.clone()),
            format: PlanFormat::Json,
        })
        .unwrap();
        assert_eq!(code, 0);

        let content = std::fs::read_to_string(&out).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        let nodes = parsed["nodes"].as_array().unwrap();
        // 17 gateway nodes plus queue, topic, subscription, task flow.
        assert_eq!(nodes.len(), 21);
        assert_eq!(parsed["active_stages"]["some-service"], "prod-v1");
    }

    #[test]
    fn synth_writes_yaml_when_asked() {
        let spec = write_spec(SPEC);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plan.yaml");

        let code = run_synth(&SynthArgs {
            app: spec.path().to_path_buf(),
            out: Some(out.clone()),
            format: PlanFormat::Yaml,
        })
        .unwrap();
        assert_eq!(code, 0);

        let content = std::fs::read_to_string(&out).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
        assert!(parsed["digest"].as_str().is_some());
    }

    #[test]
    fn synth_composes_the_bundled_example_spec() {
        let app = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../app.yaml");
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plan.json");

        let code = run_synth(&SynthArgs {
            app,
            out: Some(out.clone()),
            format: PlanFormat::Json,
        })
        .unwrap();
        assert_eq!(code, 0);

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        // The bundled spec declares the full support set, pipeline included.
        assert_eq!(parsed["nodes"].as_array().unwrap().len(), 22);
    }

    #[test]
    fn synth_fails_on_a_missing_spec_file() {
        let err = run_synth(&SynthArgs {
            app: PathBuf::from("/nonexistent/app.yaml"),
            out: None,
            format: PlanFormat::Json,
        })
        .unwrap_err();
        assert!(err.to_string().contains("reading application spec"));
    }
}
