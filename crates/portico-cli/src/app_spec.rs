//! # Application Spec
//!
//! The YAML input the CLI composes from. Only the handler mapping is
//! mandatory; every omitted section falls back to the fixed tables, so the
//! minimal spec is a single handler line.
//!
//! ```yaml
//! handlers:
//!   listSomeResources: "handler://some-service/list-some-resources"
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use portico_compose::{HandlerMap, SupportSpec};
use portico_core::config::{FrontendConfig, ServiceSpec, TierConfig};

/// On-disk application spec.
///
/// Identifier-typed fields deserialize through their validating
/// constructors, so a malformed spec fails at load with the offending
/// value named.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSpec {
    /// Service shape override. Omitted: the fixed
    /// `/someService/someResources` shape with its one operation.
    #[serde(default)]
    pub service: Option<ServiceSpec>,

    /// Operation-name to handler-address mapping.
    pub handlers: HandlerMap,

    /// Tier table override. Omitted: the fixed two-tier table.
    #[serde(default)]
    pub tiers: Option<Vec<TierConfig>>,

    /// Supporting resources to declare alongside the gateway.
    #[serde(default)]
    pub support: Option<SupportSpec>,
}

impl AppSpec {
    /// Load and parse a spec file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading application spec: {}", path.display()))?;
        let spec: AppSpec =
            serde_yaml::from_str(&content).with_context(|| "parsing application spec YAML")?;
        Ok(spec)
    }

    /// The composition input, with fixed-table fallbacks applied.
    pub fn frontend_config(&self) -> FrontendConfig {
        let standard = FrontendConfig::standard();
        FrontendConfig {
            service: self.service.clone().unwrap_or(standard.service),
            tiers: self.tiers.clone().unwrap_or(standard.tiers),
        }
    }
}
