//! # Idempotent Re-synthesis Tests
//!
//! Re-running composition must be safe: identical input re-derives
//! identical logical names and replays instead of duplicating, two
//! independent syntheses seal to the same digest, and changing the input
//! changes exactly the affected records.

use portico_compose::{compose_frontend, HandlerMap};
use portico_core::config::FrontendConfig;
use portico_core::error::{ComposeError, ConfigurationError};
use portico_core::identifier::{ApiKeyValue, HandlerRef, OperationName};
use portico_core::throttle::Throttle;
use portico_plan::backend::ProvisioningBackend;
use portico_plan::memory::{Disposition, PlanBackend};
use portico_plan::node::{NodeKind, NodeRecord};
use portico_plan::plan::ProvisioningPlan;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn handlers() -> HandlerMap {
    let mut map = HandlerMap::new();
    map.insert(
        OperationName::new("listSomeResources").unwrap(),
        HandlerRef::new("handler://some-service/list-some-resources").unwrap(),
    );
    map
}

fn synthesize(config: &FrontendConfig) -> ProvisioningPlan {
    let mut backend = PlanBackend::new();
    compose_frontend(&mut backend, config, &handlers()).unwrap();
    backend.finish().unwrap()
}

// ---------------------------------------------------------------------------
// 1. Replaying the composition duplicates nothing
// ---------------------------------------------------------------------------

#[test]
fn recomposing_replays_every_operation() {
    let mut backend = PlanBackend::new();
    let config = FrontendConfig::standard();
    compose_frontend(&mut backend, &config, &handlers()).unwrap();

    let count = backend.node_count();
    let names: Vec<String> = backend.nodes().iter().map(|n| n.name.clone()).collect();
    let journal_len = backend.journal().len();

    compose_frontend(&mut backend, &config, &handlers()).unwrap();

    assert_eq!(backend.node_count(), count);
    let replayed: Vec<String> = backend.nodes().iter().map(|n| n.name.clone()).collect();
    assert_eq!(replayed, names);
    assert!(backend.journal()[journal_len..]
        .iter()
        .all(|op| op.disposition == Disposition::Replayed));
}

// ---------------------------------------------------------------------------
// 2. Independent syntheses agree byte for byte
// ---------------------------------------------------------------------------

#[test]
fn identical_inputs_seal_to_identical_digests() {
    let config = FrontendConfig::standard();
    let a = synthesize(&config);
    let b = synthesize(&config);

    assert_eq!(a.digest(), b.digest());
    assert!(a.diff(&b).is_empty());
}

// ---------------------------------------------------------------------------
// 3. A throttle change touches exactly the affected records
// ---------------------------------------------------------------------------

#[test]
fn changing_one_plan_throttle_changes_two_records() {
    let base = synthesize(&FrontendConfig::standard());

    let mut config = FrontendConfig::standard();
    config.tiers[0].throttle = Throttle::new(500, 100);
    let changed = synthesize(&config);

    assert_ne!(base.digest(), changed.digest());

    let diff = base.diff(&changed);
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
    let touched: Vec<&str> = diff.changed.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(touched, ["devPlanName", "devPlanName:dev"]);
}

// ---------------------------------------------------------------------------
// 4. A conflicting re-definition collides by name
// ---------------------------------------------------------------------------

#[test]
fn a_conflicting_key_definition_names_the_collision() {
    let mut backend = PlanBackend::new();
    compose_frontend(&mut backend, &FrontendConfig::standard(), &handlers()).unwrap();

    let err = backend
        .create_api_key(
            "devApiKey",
            &ApiKeyValue::new("a-different-credential-value-01").unwrap(),
        )
        .unwrap_err();
    match err {
        ComposeError::Configuration(ConfigurationError::NameCollision { name, .. }) => {
            assert_eq!(name, "devApiKey");
        }
        other => panic!("expected a name collision, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// 5. Determinism holds for any throttle values
// ---------------------------------------------------------------------------

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn throttles() -> impl Strategy<Value = (u32, u32)> {
        (1u32..10_000, 1u32..2_000)
    }

    proptest! {
        /// Synthesis is deterministic whatever the tier throttles are.
        #[test]
        fn digests_are_stable_for_any_throttle((rate, burst) in throttles()) {
            let mut config = FrontendConfig::standard();
            config.tiers[0].throttle = Throttle::new(rate, burst);
            let a = synthesize(&config);
            let b = synthesize(&config);
            prop_assert_eq!(a.digest(), b.digest());
            prop_assert!(a.diff(&b).is_empty());
        }

        /// Every override mirrors its plan's throttle exactly.
        #[test]
        fn overrides_mirror_the_plan_throttle((rate, burst) in throttles()) {
            let mut config = FrontendConfig::standard();
            config.tiers[0].throttle = Throttle::new(rate, burst);
            let plan = synthesize(&config);

            for binding in plan.nodes_of(NodeKind::PlanStageBinding) {
                let NodeRecord::PlanStageBinding { plan: owner, overrides, .. } = &binding.record
                else {
                    panic!("expected a plan-stage binding record");
                };
                let NodeRecord::UsagePlan { throttle, .. } = &plan.node(*owner).unwrap().record
                else {
                    panic!("expected a usage plan record");
                };
                for entry in overrides {
                    prop_assert_eq!(entry.throttle, *throttle);
                }
            }
        }
    }
}
