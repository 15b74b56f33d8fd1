//! # Error Taxonomy
//!
//! Two classes of failure exist at composition time, and they are kept as
//! separate types because callers treat them differently:
//!
//! - [`ConfigurationError`] — deterministic build-time defects (a missing
//!   handler mapping, a conflicting name, an edge to a node that does not
//!   exist). Fatal and never retried: re-running would reproduce the same
//!   failure.
//! - [`BackendError`] — the provisioning backend rejecting an operation.
//!   Propagated unchanged; no rollback or retry is attempted here, since
//!   provisioning transactionality belongs to the backend layer.
//!
//! [`ComposeError`] is the umbrella the composers return. Usage-plan
//! composition wraps its failures per tier ([`TierFailure`]) so one tier's
//! defect never hides the other tier's outcome.

use thiserror::Error;

use crate::identifier::{OperationName, StageName, TierName};

/// Identifier construction failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Tier names are ASCII alphanumeric and start with a letter.
    #[error("invalid tier name '{0}'")]
    InvalidTierName(String),

    /// Stage names are `[A-Za-z0-9_-]` and start alphanumeric.
    #[error("invalid stage name '{0}'")]
    InvalidStageName(String),

    /// Operation names are ASCII alphanumeric and start with a letter.
    #[error("invalid operation name '{0}'")]
    InvalidOperationName(String),

    /// Path segments are `[A-Za-z0-9._-]` and never contain `/`.
    #[error("invalid path segment '{0}'")]
    InvalidPathSegment(String),

    /// Key material below the minimum length. The value itself is not echoed.
    #[error("API key value too short: {length} characters, minimum {minimum}")]
    KeyValueTooShort { length: usize, minimum: usize },

    /// Key material with characters outside `[A-Za-z0-9_-]`.
    #[error("API key value contains characters outside [A-Za-z0-9_-]")]
    KeyValueInvalidChar,

    /// Handler addresses are non-empty printable ASCII.
    #[error("invalid handler address '{0}'")]
    InvalidHandlerAddress(String),

    /// Digests render as exactly 64 lowercase hex characters.
    #[error("invalid digest '{0}'")]
    InvalidDigest(String),
}

/// Deterministic build-time configuration defect.
///
/// Every variant names the offending identifier so the caller can fix the
/// input spec. These are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// An operation was declared but the handler mapping has no entry for it.
    #[error("no handler mapped for operation '{operation}'")]
    MissingHandler { operation: OperationName },

    /// A node with this (kind, name) already exists with different content.
    ///
    /// Re-creating a node with *identical* content is an idempotent no-op;
    /// only a conflicting definition collides.
    #[error("duplicate {kind} name '{name}' with conflicting definition")]
    NameCollision { kind: String, name: String },

    /// A dependency edge references a node absent from the graph.
    #[error("dependency edge references unresolved node '{reference}'")]
    UnresolvedNode { reference: String },

    /// A handle references a node of the wrong kind.
    #[error("node '{reference}' is a {found}, expected a {expected}")]
    KindMismatch {
        reference: String,
        expected: String,
        found: String,
    },

    /// The dependency relation is cyclic; no build order exists.
    #[error("dependency cycle through node '{node}'")]
    DependencyCycle { node: String },

    /// The tier table marks no tier active, so no stage would receive
    /// default traffic.
    #[error("no tier in the configuration table is marked active")]
    NoActiveTier,

    /// A second tier is marked active; exactly one must be.
    #[error("tier '{tier}' is marked active but another tier already is")]
    DuplicateActiveTier { tier: TierName },

    /// Two tiers share a name; derived key/plan names would collide.
    #[error("duplicate tier name '{tier}' in configuration table")]
    DuplicateTierName { tier: TierName },

    /// Two tiers share a stage name; the stages would collide.
    #[error("duplicate stage name '{stage}' in configuration table")]
    DuplicateStageName { stage: StageName },

    /// Two operations share a name; the handler mapping could not
    /// distinguish them.
    #[error("duplicate operation '{operation}' in service specification")]
    DuplicateOperation { operation: OperationName },

    /// The service specification carries no API name.
    #[error("service API name is empty")]
    EmptyApiName,
}

/// Provisioning backend rejection, propagated unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend refused the operation outright.
    #[error("backend rejected {operation} '{name}': {reason}")]
    Rejected {
        operation: String,
        name: String,
        reason: String,
    },

    /// A provisioning quota was exhausted.
    #[error("backend quota exceeded for {kind} (limit {limit})")]
    QuotaExceeded { kind: String, limit: u32 },

    /// The backend could not parse a handler or scope address.
    #[error("backend rejected malformed address '{address}'")]
    MalformedAddress { address: String },

    /// The backend denied permission for the provisioning action itself.
    #[error("backend denied permission for {action}")]
    PermissionDenied { action: String },
}

/// One tier's composition failure, carrying the tier that failed.
#[derive(Error, Debug)]
#[error("tier '{tier}': {error}")]
pub struct TierFailure {
    /// The tier whose composition aborted.
    pub tier: TierName,
    /// The underlying failure.
    pub error: ComposeError,
}

/// Per-tier failures collected by the usage-plan composer.
///
/// One tier failing must not block the other, so failures are collected
/// rather than short-circuited; the display form lists every tier.
#[derive(Debug)]
pub struct TierFailures(pub Vec<TierFailure>);

impl std::fmt::Display for TierFailures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} tier(s) failed: ", self.0.len())?;
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for TierFailures {}

/// Collected violations from frontend-configuration validation.
///
/// Validation reports every defect in one pass, so a hand-written table is
/// fixed in one round trip rather than one error at a time.
#[derive(Debug)]
pub struct ConfigViolations(pub Vec<ConfigurationError>);

impl std::fmt::Display for ConfigViolations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} violation(s): ", self.0.len())?;
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigViolations {}

/// Umbrella error returned by the composition stages.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// Deterministic configuration defect.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Backend rejection, propagated unchanged.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The composition input failed table validation.
    #[error("frontend configuration invalid: {0}")]
    InvalidInput(ConfigViolations),

    /// Usage-plan composition failed for one or more tiers.
    #[error("usage-plan composition failed: {0}")]
    UsagePlans(TierFailures),

    /// A plan record could not be serialized for digesting.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ComposeError {
    /// True when the error (or, for per-tier failures, every inner error)
    /// is a deterministic configuration defect rather than a backend
    /// rejection.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Configuration(_) | Self::InvalidInput(_) | Self::Serialization(_) => true,
            Self::Backend(_) => false,
            Self::UsagePlans(failures) => {
                failures.0.iter().all(|f| f.error.is_configuration())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(name: &str) -> TierName {
        TierName::new(name).unwrap()
    }

    #[test]
    fn configuration_error_names_offending_identifier() {
        let err = ConfigurationError::MissingHandler {
            operation: OperationName::new("listSomeResources").unwrap(),
        };
        assert!(err.to_string().contains("listSomeResources"));

        let err = ConfigurationError::NameCollision {
            kind: "api key".into(),
            name: "devApiKey".into(),
        };
        assert!(err.to_string().contains("devApiKey"));
    }

    #[test]
    fn tier_failures_list_every_tier() {
        let failures = TierFailures(vec![
            TierFailure {
                tier: tier("dev"),
                error: ConfigurationError::NoActiveTier.into(),
            },
            TierFailure {
                tier: tier("DefaultPublicAccess"),
                error: BackendError::QuotaExceeded {
                    kind: "usage plan".into(),
                    limit: 2,
                }
                .into(),
            },
        ]);
        let rendered = failures.to_string();
        assert!(rendered.contains("'dev'"));
        assert!(rendered.contains("'DefaultPublicAccess'"));
        assert!(rendered.starts_with("2 tier(s) failed"));
    }

    #[test]
    fn config_violations_list_every_defect() {
        let violations = ConfigViolations(vec![
            ConfigurationError::EmptyApiName,
            ConfigurationError::NoActiveTier,
        ]);
        let rendered = violations.to_string();
        assert!(rendered.starts_with("2 violation(s)"));
        assert!(rendered.contains("API name is empty"));
        assert!(rendered.contains("no tier"));
    }

    #[test]
    fn is_configuration_classifies_mixed_tier_failures() {
        let config_only = ComposeError::UsagePlans(TierFailures(vec![TierFailure {
            tier: tier("dev"),
            error: ConfigurationError::NoActiveTier.into(),
        }]));
        assert!(config_only.is_configuration());

        let with_backend = ComposeError::UsagePlans(TierFailures(vec![TierFailure {
            tier: tier("dev"),
            error: BackendError::PermissionDenied {
                action: "create-api-key".into(),
            }
            .into(),
        }]));
        assert!(!with_backend.is_configuration());
    }
}
