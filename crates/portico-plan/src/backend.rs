//! # Provisioning Backend Trait
//!
//! The capability surface the composition stages provision through. The
//! backend owns allocation: it assigns physical identifiers, tracks the
//! API's active-stage pointer, and resolves stages into invocation scopes.
//! The composers own sequencing and naming.
//!
//! ## Implementations
//!
//! [`PlanBackend`](crate::memory::PlanBackend) is the canonical
//! implementation: it records every capability call as a node in an
//! in-memory plan graph and seals the result into a
//! [`ProvisioningPlan`](crate::plan::ProvisioningPlan). A backend that
//! talks to a real provisioning service implements the same trait; the
//! composers cannot tell the difference.
//!
//! ## Error contract
//!
//! Implementations return [`ConfigurationError`] variants (through
//! [`ComposeError`]) for deterministic defects such as conflicting names
//! or references to nodes that do not exist, and [`BackendError`] variants
//! for their own rejections (quota, malformed addresses, denied
//! permissions). Callers retry neither.
//!
//! [`BackendError`]: portico_core::error::BackendError
//! [`ConfigurationError`]: portico_core::error::ConfigurationError

use portico_core::config::StageSpec;
use portico_core::error::ComposeError;
use portico_core::gateway::{HttpVerb, MethodOptions};
use portico_core::identifier::{ApiKeyValue, HandlerRef, OperationName, PathSegment};
use portico_core::throttle::{MethodThrottle, Throttle};

use crate::handle::{
    ApiKeyHandle, DeploymentHandle, GrantHandle, InvocationScope, MethodHandle, ResourceHandle,
    RestApiHandle, StageHandle, UsagePlanHandle,
};
use crate::node::NodeId;

/// Capability surface of a provisioning backend.
///
/// All operations are synchronous: composition is a build-time graph, not
/// a running service, and ordering is carried by data dependencies rather
/// than a scheduler.
pub trait ProvisioningBackend {
    /// Create the REST API root the resource tree hangs off.
    fn create_rest_api(&mut self, name: &str) -> Result<RestApiHandle, ComposeError>;

    /// Create a resource under `parent` (the API root or another resource).
    ///
    /// Siblings must not share a segment; a conflicting re-creation is a
    /// configuration error.
    fn create_resource(
        &mut self,
        parent: NodeId,
        segment: &PathSegment,
    ) -> Result<ResourceHandle, ComposeError>;

    /// Attach a method to `resource`. One method exists per
    /// (resource, verb) pair; re-creating with a different integration or
    /// option set collides.
    fn create_method(
        &mut self,
        resource: &ResourceHandle,
        verb: HttpVerb,
        operation: &OperationName,
        integration: &HandlerRef,
        options: MethodOptions,
    ) -> Result<MethodHandle, ComposeError>;

    /// Snapshot the API's current resource/method tree as a deployment.
    fn create_deployment(&mut self, api: &RestApiHandle) -> Result<DeploymentHandle, ComposeError>;

    /// Instantiate a stage from a deployment snapshot per its spec.
    fn create_stage(
        &mut self,
        deployment: &DeploymentHandle,
        spec: &StageSpec,
    ) -> Result<StageHandle, ComposeError>;

    /// Point the API's default deployment target at `stage`.
    ///
    /// Reassignment is last-write-wins: marking a second stage active moves
    /// the pointer, it does not duplicate it. Callers rely on this
    /// precedence rule.
    fn set_active_stage(
        &mut self,
        api: &RestApiHandle,
        stage: &StageHandle,
    ) -> Result<(), ComposeError>;

    /// Create an API key carrying the supplied literal value.
    fn create_api_key(
        &mut self,
        name: &str,
        value: &ApiKeyValue,
    ) -> Result<ApiKeyHandle, ComposeError>;

    /// Create a usage plan with `throttle` as its default.
    fn create_usage_plan(
        &mut self,
        name: &str,
        throttle: Throttle,
    ) -> Result<UsagePlanHandle, ComposeError>;

    /// Bind `key` to `plan`; the plan is then only usable with that key.
    /// Returns the binding node.
    fn bind_key_to_plan(
        &mut self,
        plan: &UsagePlanHandle,
        key: &ApiKeyHandle,
    ) -> Result<NodeId, ComposeError>;

    /// Bind `plan` to `stage` with one throttle override per covered
    /// method. Returns the binding node.
    fn bind_plan_to_stage(
        &mut self,
        plan: &UsagePlanHandle,
        stage: &StageHandle,
        overrides: &[MethodThrottle],
    ) -> Result<NodeId, ComposeError>;

    /// Declare that `from` must be realized after `on`.
    ///
    /// Both nodes must already exist; an edge to an unknown node is a
    /// configuration error.
    fn add_dependency(&mut self, from: NodeId, on: NodeId) -> Result<(), ComposeError>;

    /// Resolve a stage into an invocation source scope for the given verb
    /// and path patterns.
    fn resolve_invocation_scope(
        &mut self,
        stage: &StageHandle,
        verb_pattern: &str,
        path_pattern: &str,
    ) -> Result<InvocationScope, ComposeError>;

    /// Grant `handler` the right to be invoked by `principal` from `scope`.
    ///
    /// The scope argument is the ordering guarantee: scopes only come from
    /// [`resolve_invocation_scope`](Self::resolve_invocation_scope), so a
    /// grant cannot precede its stage's resolution.
    fn grant_invoke(
        &mut self,
        handler: &HandlerRef,
        principal: &str,
        scope: &InvocationScope,
        name: &str,
    ) -> Result<GrantHandle, ComposeError>;
}
