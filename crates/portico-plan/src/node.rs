//! # Plan Nodes
//!
//! The node vocabulary of the provisioning plan graph. Every provisioned
//! object is one [`PlanNode`]: a kind, a logical name, an immutable record,
//! a backend-assigned physical id, and the node ids it depends on. Bindings
//! are nodes too; backends realize them as resources of their own.
//!
//! ## Logical vs physical identity
//!
//! The logical name is derived deterministically from the input spec and is
//! the idempotence key: re-composing the same spec re-derives the same
//! names. The physical id is backend-assigned and random; nothing in the
//! graph derives from it and it is excluded from digests and diffs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use portico_core::config::StageSpec;
use portico_core::digest::ContentDigest;
use portico_core::gateway::{HttpVerb, MethodOptions};
use portico_core::identifier::{ApiKeyValue, HandlerRef, OperationName, PathSegment};
use portico_core::throttle::{MethodThrottle, Throttle};

use crate::handle::InvocationScope;

/// Index of a node within one plan graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Position of this node in the graph's node vector.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// The kind of a provisioned object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    RestApi,
    Resource,
    Method,
    Deployment,
    Stage,
    ApiKey,
    UsagePlan,
    PlanKeyBinding,
    PlanStageBinding,
    Grant,
    Queue,
    Topic,
    Subscription,
    TaskFlow,
    DeliveryPipeline,
}

impl NodeKind {
    /// Human-readable kind label, used in error messages and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RestApi => "rest api",
            Self::Resource => "resource",
            Self::Method => "method",
            Self::Deployment => "deployment",
            Self::Stage => "stage",
            Self::ApiKey => "api key",
            Self::UsagePlan => "usage plan",
            Self::PlanKeyBinding => "plan-key binding",
            Self::PlanStageBinding => "plan-stage binding",
            Self::Grant => "grant",
            Self::Queue => "queue",
            Self::Topic => "topic",
            Self::Subscription => "subscription",
            Self::TaskFlow => "task flow",
            Self::DeliveryPipeline => "delivery pipeline",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The immutable configuration record of one plan node.
///
/// Records are pure configuration: once a node is created its record is
/// never mutated. Lifecycle that changes after creation (the active-stage
/// pointer, stage states) lives beside the graph, not in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeRecord {
    RestApi {
        name: String,
    },
    Resource {
        parent: NodeId,
        segment: PathSegment,
        /// Full path from the API root, `/{...}/{segment}`.
        path: String,
    },
    Method {
        resource: NodeId,
        /// Full path of the owning resource.
        path: String,
        verb: HttpVerb,
        operation: OperationName,
        integration: HandlerRef,
        options: MethodOptions,
    },
    Deployment {
        api: NodeId,
        /// Digest of the resource/method tree at snapshot time.
        tree_digest: ContentDigest,
    },
    Stage {
        deployment: NodeId,
        spec: StageSpec,
    },
    ApiKey {
        name: String,
        value: ApiKeyValue,
    },
    UsagePlan {
        name: String,
        throttle: Throttle,
    },
    PlanKeyBinding {
        plan: NodeId,
        key: NodeId,
    },
    PlanStageBinding {
        plan: NodeId,
        stage: NodeId,
        /// One override per covered method, values mirroring the plan
        /// default.
        overrides: Vec<MethodThrottle>,
    },
    Grant {
        handler: HandlerRef,
        principal: String,
        scope: InvocationScope,
    },
    Queue {
        name: String,
        visibility_timeout_secs: u32,
    },
    Topic {
        name: String,
    },
    Subscription {
        topic: NodeId,
        queue: NodeId,
    },
    TaskFlow {
        name: String,
        handler: HandlerRef,
        completion_timeout_secs: u32,
    },
    DeliveryPipeline {
        name: String,
        connection: String,
        repository: String,
        branch: String,
        synth_commands: Vec<String>,
    },
}

impl NodeRecord {
    /// The kind this record belongs to.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::RestApi { .. } => NodeKind::RestApi,
            Self::Resource { .. } => NodeKind::Resource,
            Self::Method { .. } => NodeKind::Method,
            Self::Deployment { .. } => NodeKind::Deployment,
            Self::Stage { .. } => NodeKind::Stage,
            Self::ApiKey { .. } => NodeKind::ApiKey,
            Self::UsagePlan { .. } => NodeKind::UsagePlan,
            Self::PlanKeyBinding { .. } => NodeKind::PlanKeyBinding,
            Self::PlanStageBinding { .. } => NodeKind::PlanStageBinding,
            Self::Grant { .. } => NodeKind::Grant,
            Self::Queue { .. } => NodeKind::Queue,
            Self::Topic { .. } => NodeKind::Topic,
            Self::Subscription { .. } => NodeKind::Subscription,
            Self::TaskFlow { .. } => NodeKind::TaskFlow,
            Self::DeliveryPipeline { .. } => NodeKind::DeliveryPipeline,
        }
    }
}

/// One node of the provisioning plan graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanNode {
    /// Graph-local id.
    pub id: NodeId,
    /// Kind of the provisioned object.
    pub kind: NodeKind,
    /// Deterministic logical name; the idempotence key within its kind.
    pub name: String,
    /// Immutable configuration record.
    pub record: NodeRecord,
    /// Backend-assigned physical identifier. Random; never part of logical
    /// names, digests, or diffs.
    pub physical_id: Uuid,
    /// Nodes that must be realized before this one.
    pub depends_on: Vec<NodeId>,
}
