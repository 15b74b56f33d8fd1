//! # Deployment and Stage Composition
//!
//! Third composition stage: snapshot the resource/method tree once, then
//! instantiate every tier's stage from that snapshot. The active-stage
//! assignment happens after all stages exist, and exactly once: the tier
//! table is validated down to a single active tier, so the composer never
//! leans on the backend's last-write-wins pointer precedence.

use portico_core::config::TierConfig;
use portico_core::error::ComposeError;
use portico_core::identifier::TierName;
use portico_plan::backend::ProvisioningBackend;
use portico_plan::handle::{DeploymentHandle, RestApiHandle, StageHandle};

/// One deployment snapshot and the stages instantiated from it.
#[derive(Debug, Clone)]
pub struct StageSet {
    pub deployment: DeploymentHandle,
    /// (tier, stage) pairs in tier-table order. Stage indexes in grant
    /// names follow this order.
    pub stages: Vec<(TierName, StageHandle)>,
}

impl StageSet {
    /// The stage deployed for a tier.
    pub fn stage(&self, tier: &TierName) -> Option<&StageHandle> {
        self.stages
            .iter()
            .find(|(name, _)| name == tier)
            .map(|(_, stage)| stage)
    }
}

/// Snapshot the tree as a deployment, create one stage per tier, and make
/// the single active-stage assignment.
pub fn deploy_stages(
    backend: &mut dyn ProvisioningBackend,
    api: &RestApiHandle,
    tiers: &[TierConfig],
) -> Result<StageSet, ComposeError> {
    let deployment = backend.create_deployment(api)?;

    let mut stages = Vec::with_capacity(tiers.len());
    for tier in tiers {
        let stage = backend.create_stage(&deployment, &tier.stage)?;
        tracing::info!(
            tier = %tier.name,
            stage = %stage.name,
            throttle = %tier.stage.throttle,
            logging = %tier.stage.logging,
            "deployed stage"
        );
        stages.push((tier.name.clone(), stage));
    }

    for (tier, (_, stage)) in tiers.iter().zip(&stages) {
        if tier.stage.active {
            backend.set_active_stage(api, stage)?;
            tracing::info!(stage = %stage.name, "assigned active stage");
        }
    }

    Ok(StageSet { deployment, stages })
}
