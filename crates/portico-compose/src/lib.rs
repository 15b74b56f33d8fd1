//! # portico-compose — Frontend Composition Pipeline
//!
//! Composes a throttled service front end against any
//! [`ProvisioningBackend`]: a REST resource tree, method integrations,
//! two deployed stages, per-tier API keys and usage plans, and invoke
//! grants. Ordering is carried by data: each stage's functions require
//! handles only the previous stage produces.
//!
//! ## Architecture
//!
//! - **Tree** (`tree.rs`): API root plus the two-level resource path.
//! - **Methods** (`methods.rs`): one key-required method per declared
//!   operation; the handler mapping is resolved before anything is created.
//! - **Stages** (`stages.rs`): one deployment snapshot, one stage per tier,
//!   one explicit active-stage assignment.
//! - **Plans** (`plans.rs`): per tier, the strict key → plan → key binding
//!   → stage binding (with per-method overrides) → dependency edge
//!   sequence, tiers isolated from each other's failures.
//! - **Grants** (`grants.rs`): stage × distinct-handler invoke grants over
//!   wildcard scopes.
//! - **Support** (`support.rs`): event channel, callback task flow, and
//!   delivery pipeline declarations against the in-memory plan.
//!
//! [`compose_frontend`] runs the five gateway stages in order and returns
//! every handle in [`FrontendOutputs`].
//!
//! ## Crate Policy
//!
//! - Depends on `portico-core` and `portico-plan` internally.
//! - Composition is synchronous and single-pass; re-running against the
//!   same backend is an idempotent replay.
//! - No `unsafe`.

pub mod grants;
pub mod methods;
pub mod plans;
pub mod stages;
pub mod support;
pub mod tree;

use portico_core::config::FrontendConfig;
use portico_core::error::{ComposeError, ConfigViolations};
use portico_core::identifier::TierName;
use portico_plan::backend::ProvisioningBackend;
use portico_plan::handle::{DeploymentHandle, GrantHandle, MethodHandle, RestApiHandle, StageHandle};

pub use grants::{grant_invocations, GATEWAY_PRINCIPAL};
pub use methods::{integrate_methods, HandlerMap};
pub use plans::{compose_usage_plans, TierOutputs};
pub use stages::{deploy_stages, StageSet};
pub use support::{compose_support, PipelineSpec, SupportOutputs, SupportSpec};
pub use tree::{compose_resource_tree, ResourceTree};

/// Every handle produced by a full frontend composition.
#[derive(Debug, Clone)]
pub struct FrontendOutputs {
    pub api: RestApiHandle,
    pub deployment: DeploymentHandle,
    /// Methods in operation-declaration order.
    pub methods: Vec<MethodHandle>,
    /// (tier, stage) pairs in tier-table order.
    pub stages: Vec<(TierName, StageHandle)>,
    /// Per-tier key/plan outputs, in tier-table order.
    pub tiers: Vec<TierOutputs>,
    /// Grants in (stage index, handler index) order.
    pub grants: Vec<GrantHandle>,
}

impl FrontendOutputs {
    /// The stage deployed for a tier.
    pub fn stage(&self, tier: &TierName) -> Option<&StageHandle> {
        self.stages
            .iter()
            .find(|(name, _)| name == tier)
            .map(|(_, stage)| stage)
    }
}

/// Compose the complete front end: tree, methods, stages, usage plans,
/// grants.
///
/// The input table is validated first; every violation is reported in one
/// error. The five stages then run in order, each consuming handles from
/// the previous one.
pub fn compose_frontend(
    backend: &mut dyn ProvisioningBackend,
    config: &FrontendConfig,
    handlers: &HandlerMap,
) -> Result<FrontendOutputs, ComposeError> {
    if let Err(violations) = portico_core::config::validate_frontend_config(config) {
        return Err(ComposeError::InvalidInput(ConfigViolations(violations)));
    }

    let tree = compose_resource_tree(backend, &config.service)?;
    let methods = integrate_methods(backend, &tree.resource, &config.service, handlers)?;
    let stage_set = deploy_stages(backend, &tree.api, &config.tiers)?;
    let tiers = compose_usage_plans(backend, &config.tiers, &stage_set, &methods)?;
    let grants = grant_invocations(backend, &stage_set.stages, &methods)?;

    tracing::info!(
        api = %tree.api.name,
        methods = methods.len(),
        stages = stage_set.stages.len(),
        grants = grants.len(),
        "frontend composition complete"
    );

    Ok(FrontendOutputs {
        api: tree.api,
        deployment: stage_set.deployment,
        methods,
        stages: stage_set.stages,
        tiers,
        grants,
    })
}
