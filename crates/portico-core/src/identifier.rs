//! # Identifier Newtypes
//!
//! Domain-primitive newtypes for the names that flow through composition.
//! Each identifier is a distinct type — you cannot pass an [`OperationName`]
//! where a [`TierName`] is expected.
//!
//! ## Validation
//!
//! Every identifier validates its format at construction time. Deserialization
//! routes through the same constructors, so a hand-edited application spec
//! cannot smuggle an invalid name into the composition graph.
//!
//! ## Naming
//!
//! Derived names (API key name, usage plan name) are pure functions of the
//! tier name. Re-deriving them for the same tier always yields the same
//! string, which is what makes re-composition idempotent.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Helper macro to implement `Deserialize` for string newtypes that must
/// validate their contents. Deserializes as a plain `String`, then routes
/// through the type's `new()` constructor so that invalid values are
/// rejected at deserialization time — not silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Tier name
// ---------------------------------------------------------------------------

/// The name of one throttling/environment tier (`dev`, `DefaultPublicAccess`).
///
/// Tier names seed every derived name in the tier's slice of the graph:
/// the API key is named `{tier}ApiKey` and the usage plan `{tier}PlanName`.
///
/// # Validation
///
/// - Non-empty
/// - ASCII alphanumeric only
/// - First character must be a letter
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TierName(String);

impl_validating_deserialize!(TierName);

impl TierName {
    /// Create a tier name, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTierName`] if the string is empty,
    /// contains non-alphanumeric characters, or starts with a digit.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let head_ok = s.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if !head_ok || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidTierName(s));
        }
        Ok(Self(s))
    }

    /// Access the tier name string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derived name of the tier's API key: `{tier}ApiKey`.
    pub fn api_key_name(&self) -> String {
        format!("{}ApiKey", self.0)
    }

    /// Derived name of the tier's usage plan: `{tier}PlanName`.
    pub fn usage_plan_name(&self) -> String {
        format!("{}PlanName", self.0)
    }
}

impl std::fmt::Display for TierName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Stage name
// ---------------------------------------------------------------------------

/// The name of a deployed stage (`dev`, `prod-v1`).
///
/// Stage names appear in invocation scopes and must be stable across
/// re-composition, so they are carried verbatim from the tier table rather
/// than generated.
///
/// # Validation
///
/// - Non-empty
/// - ASCII alphanumeric, `-`, or `_`
/// - First character must be alphanumeric
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StageName(String);

impl_validating_deserialize!(StageName);

impl StageName {
    /// Create a stage name, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidStageName`] on empty input or
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let head_ok = s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
        let body_ok = s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !head_ok || !body_ok {
            return Err(ValidationError::InvalidStageName(s));
        }
        Ok(Self(s))
    }

    /// Access the stage name string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Operation name
// ---------------------------------------------------------------------------

/// A logical operation name (`listSomeResources`).
///
/// Operation names key the handler mapping and label the method each
/// operation becomes. One HTTP method is attached per operation.
///
/// # Validation
///
/// - Non-empty
/// - ASCII alphanumeric only
/// - First character must be a letter
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OperationName(String);

impl_validating_deserialize!(OperationName);

impl OperationName {
    /// Create an operation name, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidOperationName`] if the string is
    /// empty, contains non-alphanumeric characters, or starts with a digit.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let head_ok = s.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if !head_ok || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidOperationName(s));
        }
        Ok(Self(s))
    }

    /// Access the operation name string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OperationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Path segment
// ---------------------------------------------------------------------------

/// One segment of a REST resource path (`someService`, `someResources`).
///
/// Segments never contain `/`; full paths are assembled by the resource
/// tree, which enforces that no two siblings share a segment.
///
/// # Validation
///
/// - Non-empty
/// - ASCII alphanumeric, `-`, `_`, or `.`
/// - Must not contain `/`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PathSegment(String);

impl_validating_deserialize!(PathSegment);

impl PathSegment {
    /// Create a path segment, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPathSegment`] on empty input or
    /// characters outside `[A-Za-z0-9._-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let ok = !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
        if !ok {
            return Err(ValidationError::InvalidPathSegment(s));
        }
        Ok(Self(s))
    }

    /// Access the segment string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// API key value
// ---------------------------------------------------------------------------

/// The literal credential value carried by a provisioned API key.
///
/// The value is supplied by the tier table, not generated, so that the same
/// key material is provisioned on every re-composition.
///
/// # Validation
///
/// - At least 20 characters (gateway backends reject shorter key material)
/// - ASCII alphanumeric, `-`, or `_`
///
/// Error values never echo the key material; only its length is reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ApiKeyValue(String);

impl_validating_deserialize!(ApiKeyValue);

/// Minimum accepted key value length.
pub const MIN_KEY_VALUE_LEN: usize = 20;

impl ApiKeyValue {
    /// Create a key value, validating length and character set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::KeyValueTooShort`] below 20 characters, or
    /// [`ValidationError::KeyValueInvalidChar`] for characters outside
    /// `[A-Za-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.len() < MIN_KEY_VALUE_LEN {
            return Err(ValidationError::KeyValueTooShort {
                length: s.len(),
                minimum: MIN_KEY_VALUE_LEN,
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::KeyValueInvalidChar);
        }
        Ok(Self(s))
    }

    /// Access the literal key value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Handler reference
// ---------------------------------------------------------------------------

/// An opaque reference to a backend compute unit.
///
/// Identity is the resolved address: two references with the same address
/// are the same handler, and the grant composer deduplicates on it. The
/// referenced compute is not owned by this crate; the address is only
/// carried into method integrations and invoke grants.
///
/// # Validation
///
/// - Non-empty
/// - Printable ASCII, no whitespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HandlerRef(String);

impl_validating_deserialize!(HandlerRef);

impl HandlerRef {
    /// Create a handler reference from its resolved address.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidHandlerAddress`] on empty input or
    /// non-printable/whitespace characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ValidationError::InvalidHandlerAddress(s));
        }
        Ok(Self(s))
    }

    /// The resolved address of the handler.
    pub fn address(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
