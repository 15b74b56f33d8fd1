//! # Configuration Tables
//!
//! The immutable configuration structures the composers consume: the service
//! specification (resource path shape and declared operations) and the
//! two-entry tier table (stage settings, throttles, key material). The fixed
//! instances live in [`ServiceSpec::standard`] and [`FrontendConfig::standard`]
//! so the table is a single testable source of truth rather than literals
//! scattered through control flow.
//!
//! [`validate_frontend_config`] collects every violation instead of stopping
//! at the first, so a caller fixing a hand-written table sees the whole list
//! at once.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::gateway::{HttpVerb, LoggingLevel};
use crate::identifier::{ApiKeyValue, OperationName, PathSegment, StageName, TierName};
use crate::throttle::Throttle;

/// One declared operation: a logical name and the HTTP verb it becomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    /// Logical operation name; keys the handler mapping.
    pub name: OperationName,
    /// Verb of the method the operation is attached as.
    pub verb: HttpVerb,
}

/// The service's resource shape and operation set.
///
/// The resource tree is a fixed two-level path: `/{service}/{resource}`.
/// Every declared operation attaches to the leaf resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Name of the REST API itself.
    pub api_name: String,
    /// First path segment under the root.
    pub service_segment: PathSegment,
    /// Leaf path segment under the service segment.
    pub resource_segment: PathSegment,
    /// Declared operations, in order. The order is significant: it becomes
    /// the canonical method order consumed by throttle-override construction.
    pub operations: Vec<OperationSpec>,
}

impl ServiceSpec {
    /// The fixed service shape: `/someService/someResources` with a single
    /// `listSomeResources` GET operation.
    pub fn standard() -> Self {
        Self {
            api_name: "some-service".to_string(),
            service_segment: PathSegment::new("someService")
                .expect("fixed service table literals are valid"),
            resource_segment: PathSegment::new("someResources")
                .expect("fixed service table literals are valid"),
            operations: vec![OperationSpec {
                name: OperationName::new("listSomeResources")
                    .expect("fixed service table literals are valid"),
                verb: HttpVerb::Get,
            }],
        }
    }

    /// The full leaf resource path, `/{service}/{resource}`.
    pub fn resource_path(&self) -> String {
        format!("/{}/{}", self.service_segment, self.resource_segment)
    }
}

/// Configuration for one deployment stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Stage name (`dev`, `prod-v1`).
    pub name: StageName,
    /// Whether response caching is enabled. Off for both fixed stages.
    pub caching_enabled: bool,
    /// Execution-log verbosity.
    pub logging: LoggingLevel,
    /// Stage-level default method throttle.
    pub throttle: Throttle,
    /// Whether this stage is the API's default deployment target.
    /// Exactly one stage per table may set this.
    pub active: bool,
}

/// One tier of the throttling/environment table.
///
/// A tier owns its stage configuration, its plan-level throttle, and the
/// literal key material its API key carries. Key and plan names are derived
/// from the tier name, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Tier name; seeds `{name}ApiKey` and `{name}PlanName`.
    pub name: TierName,
    /// The stage this tier deploys and binds its plan to.
    pub stage: StageSpec,
    /// Plan-level default throttle, also used for every per-method override.
    pub throttle: Throttle,
    /// Literal credential value for the tier's API key.
    pub key_value: ApiKeyValue,
}

/// The complete composition input: service shape plus tier table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Service shape and operations.
    pub service: ServiceSpec,
    /// Tier table, in declaration order. Stage and grant indexes follow
    /// this order.
    pub tiers: Vec<TierConfig>,
}

impl FrontendConfig {
    /// The fixed two-tier table.
    ///
    /// | Tier | Stage | Rate | Burst | Logging | Active |
    /// |---|---|---|---|---|---|
    /// | `dev` | `dev` | 1000 | 200 | INFO | no |
    /// | `DefaultPublicAccess` | `prod-v1` | 10 | 2 | ERROR | yes |
    ///
    /// These literals are compatibility-critical and must not drift.
    pub fn standard() -> Self {
        let dev_throttle = Throttle::new(1000, 200);
        let prod_throttle = Throttle::new(10, 2);
        Self {
            service: ServiceSpec::standard(),
            tiers: vec![
                TierConfig {
                    name: TierName::new("dev").expect("fixed tier table literals are valid"),
                    stage: StageSpec {
                        name: StageName::new("dev")
                            .expect("fixed tier table literals are valid"),
                        caching_enabled: false,
                        logging: LoggingLevel::Info,
                        throttle: dev_throttle,
                        active: false,
                    },
                    throttle: dev_throttle,
                    key_value: ApiKeyValue::new("dev-tier-shared-access-key-0001")
                        .expect("fixed tier table literals are valid"),
                },
                TierConfig {
                    name: TierName::new("DefaultPublicAccess")
                        .expect("fixed tier table literals are valid"),
                    stage: StageSpec {
                        name: StageName::new("prod-v1")
                            .expect("fixed tier table literals are valid"),
                        caching_enabled: false,
                        logging: LoggingLevel::Error,
                        throttle: prod_throttle,
                        active: true,
                    },
                    throttle: prod_throttle,
                    key_value: ApiKeyValue::new("public-tier-default-access-key-0001")
                        .expect("fixed tier table literals are valid"),
                },
            ],
        }
    }

    /// The tier marked active, if the table is well formed.
    pub fn active_tier(&self) -> Option<&TierConfig> {
        self.tiers.iter().find(|t| t.stage.active)
    }

    /// Look up a tier by name.
    pub fn tier(&self, name: &TierName) -> Option<&TierConfig> {
        self.tiers.iter().find(|t| &t.name == name)
    }
}

/// Validate a composition input, collecting every violation.
///
/// Checks, in order:
///
/// 1. The API name is non-empty.
/// 2. Exactly one tier is marked active.
/// 3. Tier names are unique (derived key/plan names would otherwise collide).
/// 4. Stage names are unique across tiers.
/// 5. Operation names are unique.
pub fn validate_frontend_config(config: &FrontendConfig) -> Result<(), Vec<ConfigurationError>> {
    let mut errors = Vec::new();

    // 1. API name present
    if config.service.api_name.is_empty() {
        errors.push(ConfigurationError::EmptyApiName);
    }

    // 2. Exactly one active tier
    let mut active_seen = false;
    for tier in &config.tiers {
        if tier.stage.active {
            if active_seen {
                errors.push(ConfigurationError::DuplicateActiveTier {
                    tier: tier.name.clone(),
                });
            }
            active_seen = true;
        }
    }
    if !active_seen {
        errors.push(ConfigurationError::NoActiveTier);
    }

    // 3. Unique tier names
    let mut tier_names = std::collections::BTreeSet::new();
    for tier in &config.tiers {
        if !tier_names.insert(tier.name.clone()) {
            errors.push(ConfigurationError::DuplicateTierName {
                tier: tier.name.clone(),
            });
        }
    }

    // 4. Unique stage names
    let mut stage_names = std::collections::BTreeSet::new();
    for tier in &config.tiers {
        if !stage_names.insert(tier.stage.name.clone()) {
            errors.push(ConfigurationError::DuplicateStageName {
                stage: tier.stage.name.clone(),
            });
        }
    }

    // 5. Unique operation names
    let mut operation_names = std::collections::BTreeSet::new();
    for op in &config.service.operations {
        if !operation_names.insert(op.name.clone()) {
            errors.push(ConfigurationError::DuplicateOperation {
                operation: op.name.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- fixed table ----

    #[test]
    fn standard_table_carries_fixed_literals() {
        let config = FrontendConfig::standard();
        assert_eq!(config.tiers.len(), 2);

        let dev = &config.tiers[0];
        assert_eq!(dev.name.as_str(), "dev");
        assert_eq!(dev.stage.name.as_str(), "dev");
        assert_eq!(dev.throttle, Throttle::new(1000, 200));
        assert_eq!(dev.stage.logging, LoggingLevel::Info);
        assert!(!dev.stage.caching_enabled);
        assert!(!dev.stage.active);

        let prod = &config.tiers[1];
        assert_eq!(prod.name.as_str(), "DefaultPublicAccess");
        assert_eq!(prod.stage.name.as_str(), "prod-v1");
        assert_eq!(prod.throttle, Throttle::new(10, 2));
        assert_eq!(prod.stage.logging, LoggingLevel::Error);
        assert!(!prod.stage.caching_enabled);
        assert!(prod.stage.active);
    }

    #[test]
    fn standard_table_derives_fixed_names() {
        let config = FrontendConfig::standard();
        assert_eq!(config.tiers[0].name.api_key_name(), "devApiKey");
        assert_eq!(config.tiers[0].name.usage_plan_name(), "devPlanName");
        assert_eq!(
            config.tiers[1].name.api_key_name(),
            "DefaultPublicAccessApiKey"
        );
        assert_eq!(
            config.tiers[1].name.usage_plan_name(),
            "DefaultPublicAccessPlanName"
        );
    }

    #[test]
    fn standard_service_path_is_fixed() {
        let service = ServiceSpec::standard();
        assert_eq!(service.resource_path(), "/someService/someResources");
        assert_eq!(service.operations.len(), 1);
        assert_eq!(service.operations[0].name.as_str(), "listSomeResources");
        assert_eq!(service.operations[0].verb, HttpVerb::Get);
    }

    #[test]
    fn active_tier_is_prod() {
        let config = FrontendConfig::standard();
        let active = config.active_tier().unwrap();
        assert_eq!(active.name.as_str(), "DefaultPublicAccess");
        assert_eq!(active.stage.name.as_str(), "prod-v1");
    }

    // ---- validation ----

    #[test]
    fn standard_table_validates_clean() {
        assert!(validate_frontend_config(&FrontendConfig::standard()).is_ok());
    }

    #[test]
    fn validation_rejects_zero_active_tiers() {
        let mut config = FrontendConfig::standard();
        for tier in &mut config.tiers {
            tier.stage.active = false;
        }
        let errors = validate_frontend_config(&config).unwrap_err();
        assert!(errors.contains(&ConfigurationError::NoActiveTier));
    }

    #[test]
    fn validation_rejects_two_active_tiers() {
        let mut config = FrontendConfig::standard();
        config.tiers[0].stage.active = true;
        let errors = validate_frontend_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigurationError::DuplicateActiveTier { .. })));
    }

    #[test]
    fn validation_rejects_duplicate_tier_names() {
        let mut config = FrontendConfig::standard();
        config.tiers[1].name = config.tiers[0].name.clone();
        let errors = validate_frontend_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigurationError::DuplicateTierName { .. })));
    }

    #[test]
    fn validation_rejects_duplicate_stage_names() {
        let mut config = FrontendConfig::standard();
        config.tiers[1].stage.name = config.tiers[0].stage.name.clone();
        let errors = validate_frontend_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigurationError::DuplicateStageName { .. })));
    }

    #[test]
    fn validation_rejects_duplicate_operations() {
        let mut config = FrontendConfig::standard();
        let op = config.service.operations[0].clone();
        config.service.operations.push(op);
        let errors = validate_frontend_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigurationError::DuplicateOperation { .. })));
    }

    #[test]
    fn validation_collects_every_violation() {
        let mut config = FrontendConfig::standard();
        config.service.api_name.clear();
        for tier in &mut config.tiers {
            tier.stage.active = false;
        }
        let errors = validate_frontend_config(&config).unwrap_err();
        assert!(errors.len() >= 2);
    }

    // ---- serde ----

    #[test]
    fn config_round_trips_through_json() {
        let config = FrontendConfig::standard();
        let json = serde_json::to_string(&config).unwrap();
        let back: FrontendConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
