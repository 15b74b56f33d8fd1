//! # portico-core — Foundational Types for Portico
//!
//! This crate is the bedrock of the Portico workspace. It defines the
//! vocabulary every other crate composes with: validated identifier
//! newtypes, the gateway enumerations, the fixed tier configuration tables,
//! the error taxonomy, and content digests. Every other crate in the
//! workspace depends on `portico-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `TierName`, `StageName`,
//!    `OperationName`, `PathSegment`, `ApiKeyValue`, `HandlerRef` — all
//!    newtypes with validated constructors. No bare strings for identifiers.
//!
//! 2. **Derived names are pure functions.** Key and plan names come from
//!    `TierName::api_key_name()` / `usage_plan_name()` and nowhere else,
//!    which is what makes re-composition idempotent.
//!
//! 3. **Configuration is data.** The fixed two-tier table is an immutable
//!    structure (`FrontendConfig::standard()`) passed into the composers,
//!    not literals scattered through control flow.
//!
//! 4. **Two error classes.** `ConfigurationError` (deterministic, fatal,
//!    names the offending identifier) and `BackendError` (propagated
//!    unchanged). Composers never retry either.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `portico-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod config;
pub mod digest;
pub mod error;
pub mod gateway;
pub mod identifier;
pub mod throttle;

// Re-export primary types for ergonomic imports.
pub use config::{
    validate_frontend_config, FrontendConfig, OperationSpec, ServiceSpec, StageSpec, TierConfig,
};
pub use digest::{digest_of, ContentDigest};
pub use error::{
    BackendError, ComposeError, ConfigViolations, ConfigurationError, TierFailure, TierFailures,
    ValidationError,
};
pub use gateway::{HttpVerb, LoggingLevel, MethodOptions};
pub use identifier::{
    ApiKeyValue, HandlerRef, OperationName, PathSegment, StageName, TierName, MIN_KEY_VALUE_LEN,
};
pub use throttle::{MethodThrottle, Throttle};
