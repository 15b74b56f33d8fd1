//! # Invocation Grant Composition
//!
//! Fifth composition stage: for every stage and every distinct handler, a
//! grant letting gateway-originated traffic from that stage invoke the
//! handler. The grant wants the whole stage as its origin, so scopes use
//! the wildcard verb and path patterns.
//!
//! Grant names compose the stage index (tier-table order) and the handler
//! index (address order), so a re-run derives the same names.

use std::collections::BTreeSet;

use portico_core::error::ComposeError;
use portico_core::identifier::{HandlerRef, TierName};
use portico_plan::backend::ProvisioningBackend;
use portico_plan::handle::{GrantHandle, MethodHandle, StageHandle};

/// The gateway-side principal grants authorize.
pub const GATEWAY_PRINCIPAL: &str = "gateway.portico.internal";

/// Verb pattern covering every method of a stage.
const ANY_VERB: &str = "*";
/// Path pattern covering every resource of a stage.
const ANY_PATH: &str = "/*";

/// Grant every distinct integrated handler invocation rights from every
/// stage's origin.
pub fn grant_invocations(
    backend: &mut dyn ProvisioningBackend,
    stages: &[(TierName, StageHandle)],
    methods: &[MethodHandle],
) -> Result<Vec<GrantHandle>, ComposeError> {
    let handlers = distinct_handlers(methods);
    let mut grants = Vec::with_capacity(stages.len() * handlers.len());

    for (stage_index, (_, stage)) in stages.iter().enumerate() {
        let scope = backend.resolve_invocation_scope(stage, ANY_VERB, ANY_PATH)?;
        for (handler_index, handler) in handlers.iter().enumerate() {
            let name = format!("invoke-grant-s{stage_index}-h{handler_index}");
            let grant = backend.grant_invoke(handler, GATEWAY_PRINCIPAL, &scope, &name)?;
            tracing::debug!(grant = %grant.name, stage = %stage.name, handler = %handler, "granted invocation");
            grants.push(grant);
        }
    }

    tracing::info!(grants = grants.len(), "composed invocation grants");
    Ok(grants)
}

/// The distinct handlers behind a method list, in address order. Two
/// methods sharing a handler yield one grant per stage, not two.
fn distinct_handlers(methods: &[MethodHandle]) -> Vec<HandlerRef> {
    let set: BTreeSet<&HandlerRef> = methods.iter().map(|m| &m.integration).collect();
    set.into_iter().cloned().collect()
}
