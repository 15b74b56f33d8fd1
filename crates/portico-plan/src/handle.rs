//! # Typed Handles
//!
//! Each backend capability returns a typed handle naming what it created.
//! Handles are how stage ordering stays structural: the method integrator
//! needs a [`ResourceHandle`], the usage-plan composer a [`StageHandle`]
//! and the method list, the grant composer an [`InvocationScope`] — none
//! of which exist until the producing stage has run.
//!
//! Handles are cheap to clone and carry only what later stages read; the
//! full record stays in the graph.

use serde::{Deserialize, Serialize};

use portico_core::digest::ContentDigest;
use portico_core::gateway::HttpVerb;
use portico_core::identifier::{HandlerRef, OperationName, StageName};

use crate::node::NodeId;

/// Handle to the REST API node; its node id doubles as the tree root for
/// resource creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestApiHandle {
    pub node: NodeId,
    pub name: String,
}

impl RestApiHandle {
    /// The parent id under which top-level resources are created.
    pub fn root(&self) -> NodeId {
        self.node
    }
}

/// Handle to a resource node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub node: NodeId,
    /// Full path from the API root.
    pub path: String,
}

/// Handle to a provisioned method: one (resource, verb) binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodHandle {
    pub node: NodeId,
    /// Owning resource node.
    pub resource: NodeId,
    /// Full path of the owning resource.
    pub path: String,
    pub verb: HttpVerb,
    /// The logical operation this method realizes.
    pub operation: OperationName,
    /// The handler the method integrates with; grants are derived from
    /// the distinct set of these.
    pub integration: HandlerRef,
}

/// Handle to a deployment snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentHandle {
    pub node: NodeId,
    /// Digest of the resource/method tree at snapshot time.
    pub tree_digest: ContentDigest,
}

/// Handle to a deployed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageHandle {
    pub node: NodeId,
    pub name: StageName,
}

/// Handle to a provisioned API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyHandle {
    pub node: NodeId,
    pub name: String,
}

/// Handle to a provisioned usage plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsagePlanHandle {
    pub node: NodeId,
    pub name: String,
}

/// A resolved invocation source scope for one stage.
///
/// Only the backend can produce one (resolution needs the realized stage),
/// which is what guarantees no grant ever references an unresolved stage:
/// the grant capability takes a scope, and a scope proves resolution
/// happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationScope {
    /// The stage this scope is rooted at.
    pub stage: StageName,
    /// Verb pattern; the grant composer uses the wildcard `*`.
    pub verb_pattern: String,
    /// Resource path pattern; the grant composer uses the wildcard `/*`.
    pub path_pattern: String,
    /// The resolved origin address,
    /// `gateway:{api}:{stage}/{verb-pattern}{path-pattern}`.
    pub source: String,
}

/// Handle to an invoke grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantHandle {
    pub node: NodeId,
    /// Stable grant name, composite of stage and handler indexes.
    pub name: String,
    /// The stage whose origin the grant covers.
    pub stage: StageName,
    /// The handler granted invocation.
    pub handler: HandlerRef,
}
