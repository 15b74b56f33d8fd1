//! # Usage-Plan Composition
//!
//! Fourth composition stage: the per-tier key/plan slice. For each tier,
//! in table order, a strict sequence:
//!
//! 1. API key carrying the tier's literal credential value.
//! 2. Usage plan carrying the tier-level throttle.
//! 3. Key-to-plan binding.
//! 4. Plan-to-stage binding, with one throttle override per covered method
//!    (always the tier-level values; no per-method differentiation).
//! 5. Ordering edges: the plan depends on every covered method, and the
//!    bindings on what they bind. The build order can then never realize a
//!    plan-to-stage association before its methods exist.
//!
//! A tier that fails mid-sequence stops provisioning further entities for
//! that tier only; the other tier still runs, and the combined failure
//! names every tier that failed.

use portico_core::config::TierConfig;
use portico_core::error::{ComposeError, ConfigurationError, TierFailure, TierFailures};
use portico_core::identifier::TierName;
use portico_core::throttle::{MethodThrottle, Throttle};
use portico_plan::backend::ProvisioningBackend;
use portico_plan::handle::{ApiKeyHandle, MethodHandle, UsagePlanHandle};
use portico_plan::node::NodeId;

use crate::stages::StageSet;

/// Handles and binding nodes produced for one tier.
#[derive(Debug, Clone)]
pub struct TierOutputs {
    pub tier: TierName,
    pub key: ApiKeyHandle,
    pub plan: UsagePlanHandle,
    pub key_binding: NodeId,
    pub stage_binding: NodeId,
}

/// Compose every tier's key, plan, and bindings.
///
/// # Errors
///
/// [`ComposeError::UsagePlans`] carrying one [`TierFailure`] per failed
/// tier. Tiers are isolated: one failing does not stop the others.
pub fn compose_usage_plans(
    backend: &mut dyn ProvisioningBackend,
    tiers: &[TierConfig],
    stages: &StageSet,
    methods: &[MethodHandle],
) -> Result<Vec<TierOutputs>, ComposeError> {
    let mut outputs = Vec::with_capacity(tiers.len());
    let mut failures = Vec::new();

    for tier in tiers {
        match compose_tier(backend, tier, stages, methods) {
            Ok(output) => outputs.push(output),
            Err(error) => {
                tracing::warn!(tier = %tier.name, %error, "tier composition failed");
                failures.push(TierFailure {
                    tier: tier.name.clone(),
                    error,
                });
            }
        }
    }

    if failures.is_empty() {
        tracing::info!(tiers = outputs.len(), "composed usage plans");
        Ok(outputs)
    } else {
        Err(ComposeError::UsagePlans(TierFailures(failures)))
    }
}

/// One override entry per covered method, all carrying the tier throttle.
pub fn method_overrides(methods: &[MethodHandle], throttle: Throttle) -> Vec<MethodThrottle> {
    methods
        .iter()
        .map(|method| MethodThrottle {
            path: method.path.clone(),
            verb: method.verb,
            throttle,
        })
        .collect()
}

fn compose_tier(
    backend: &mut dyn ProvisioningBackend,
    tier: &TierConfig,
    stages: &StageSet,
    methods: &[MethodHandle],
) -> Result<TierOutputs, ComposeError> {
    let stage = stages
        .stage(&tier.name)
        .ok_or_else(|| ConfigurationError::UnresolvedNode {
            reference: tier.stage.name.as_str().to_string(),
        })?
        .clone();

    // 1. API key with the tier's literal credential value.
    let key = backend.create_api_key(&tier.name.api_key_name(), &tier.key_value)?;
    // 2. Usage plan with the tier-level throttle.
    let plan = backend.create_usage_plan(&tier.name.usage_plan_name(), tier.throttle)?;
    // 3. Key binding.
    let key_binding = backend.bind_key_to_plan(&plan, &key)?;
    // 4. Stage binding with per-method overrides.
    let overrides = method_overrides(methods, tier.throttle);
    let stage_binding = backend.bind_plan_to_stage(&plan, &stage, &overrides)?;
    // 5. Ordering edges: the plan follows every covered method, the
    //    bindings follow what they bind.
    for method in methods {
        backend.add_dependency(plan.node, method.node)?;
    }
    backend.add_dependency(key_binding, plan.node)?;
    backend.add_dependency(key_binding, key.node)?;
    backend.add_dependency(stage_binding, plan.node)?;
    backend.add_dependency(stage_binding, stage.node)?;

    tracing::debug!(
        tier = %tier.name,
        key = %key.name,
        plan = %plan.name,
        overrides = overrides.len(),
        "composed tier"
    );

    Ok(TierOutputs {
        tier: tier.name.clone(),
        key,
        plan,
        key_binding,
        stage_binding,
    })
}
