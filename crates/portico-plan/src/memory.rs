//! # In-Memory Plan Backend
//!
//! The canonical [`ProvisioningBackend`]: every capability call is recorded
//! as a node in an in-memory graph, and [`PlanBackend::finish`] seals the
//! result into a [`ProvisioningPlan`].
//!
//! ## Idempotent upsert
//!
//! Nodes are keyed by (kind, logical name). Re-creating a node with an
//! identical record returns the existing handle — this is what makes
//! re-composition of the same spec safe to repeat. The same name with a
//! *different* record is a name collision and fails with the offending
//! identifier.
//!
//! ## Lifecycle beside the graph
//!
//! Node records are never mutated. State that changes after creation (the
//! per-API active-stage pointer, each stage's `deployed`/`active` state)
//! lives in side tables, and the operation journal records every capability
//! invocation with a UTC timestamp.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use portico_core::config::StageSpec;
use portico_core::digest::digest_of;
use portico_core::error::{ComposeError, ConfigurationError};
use portico_core::gateway::{HttpVerb, MethodOptions};
use portico_core::identifier::{ApiKeyValue, HandlerRef, OperationName, PathSegment};
use portico_core::throttle::{MethodThrottle, Throttle};

use crate::backend::ProvisioningBackend;
use crate::handle::{
    ApiKeyHandle, DeploymentHandle, GrantHandle, InvocationScope, MethodHandle, ResourceHandle,
    RestApiHandle, StageHandle, UsagePlanHandle,
};
use crate::node::{NodeId, NodeKind, NodeRecord, PlanNode};
use crate::plan::ProvisioningPlan;

/// Runtime state of a stage within one backend.
///
/// There is no `unprovisioned` value: before `create_stage` there is
/// simply no node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// Created from a deployment snapshot; not the default target.
    Deployed,
    /// The API's current default deployment target.
    Active,
}

impl StageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployed => "deployed",
            Self::Active => "active",
        }
    }
}

impl std::fmt::Display for StageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one journaled capability call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The call created a node or moved a pointer.
    Created,
    /// The call changed nothing: an idempotent re-run hit, a duplicate
    /// dependency edge, or a read-style capability.
    Replayed,
}

/// One journal entry. Timestamps never enter the sealed plan, which must
/// stay deterministic.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub sequence: u64,
    pub operation: &'static str,
    pub name: String,
    pub disposition: Disposition,
    pub recorded_at: DateTime<Utc>,
}

/// In-memory recording backend.
#[derive(Debug, Default)]
pub struct PlanBackend {
    nodes: Vec<PlanNode>,
    index: BTreeMap<(NodeKind, String), NodeId>,
    /// Per-API active-stage pointer (api node → stage node).
    active_stages: BTreeMap<NodeId, NodeId>,
    stage_states: BTreeMap<NodeId, StageState>,
    journal: Vec<OperationRecord>,
}

impl PlanBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded nodes, in creation order.
    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    /// Number of recorded nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&PlanNode> {
        self.nodes.get(id.index())
    }

    /// The capability-call journal, in call order.
    pub fn journal(&self) -> &[OperationRecord] {
        &self.journal
    }

    /// Runtime state of a stage node.
    pub fn stage_state(&self, stage: NodeId) -> Option<StageState> {
        self.stage_states.get(&stage).copied()
    }

    /// The stage an API's active pointer currently targets.
    pub fn active_stage_of(&self, api: NodeId) -> Option<NodeId> {
        self.active_stages.get(&api).copied()
    }

    /// Seal the recorded graph into a validated, ordered plan artifact.
    ///
    /// # Errors
    ///
    /// Fails if a dependency edge references a missing node or the edge
    /// relation is cyclic.
    pub fn finish(self) -> Result<ProvisioningPlan, ComposeError> {
        let mut active_by_api = BTreeMap::new();
        for (api, stage) in &self.active_stages {
            let api_name = match &self.nodes[api.index()].record {
                NodeRecord::RestApi { name } => name.clone(),
                _ => continue,
            };
            if let NodeRecord::Stage { spec, .. } = &self.nodes[stage.index()].record {
                active_by_api.insert(api_name, spec.name.clone());
            }
        }
        ProvisioningPlan::seal(self.nodes, active_by_api)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn record_op(&mut self, operation: &'static str, name: &str, disposition: Disposition) {
        self.journal.push(OperationRecord {
            sequence: self.journal.len() as u64,
            operation,
            name: name.to_string(),
            disposition,
            recorded_at: Utc::now(),
        });
    }

    /// Insert a node, or return the existing one when the record is
    /// identical. A same-name node with different content collides.
    fn upsert(
        &mut self,
        name: String,
        record: NodeRecord,
        deps: Vec<NodeId>,
        operation: &'static str,
    ) -> Result<NodeId, ComposeError> {
        let kind = record.kind();
        if let Some(&existing) = self.index.get(&(kind, name.clone())) {
            if self.nodes[existing.index()].record == record {
                for dep in deps {
                    let have = &mut self.nodes[existing.index()].depends_on;
                    if !have.contains(&dep) {
                        have.push(dep);
                    }
                }
                self.record_op(operation, &name, Disposition::Replayed);
                return Ok(existing);
            }
            return Err(ConfigurationError::NameCollision {
                kind: kind.as_str().to_string(),
                name,
            }
            .into());
        }

        let id = NodeId::new(self.nodes.len() as u32);
        tracing::debug!(kind = kind.as_str(), name = %name, node = %id, "recorded plan node");
        self.nodes.push(PlanNode {
            id,
            kind,
            name: name.clone(),
            record,
            physical_id: Uuid::new_v4(),
            depends_on: deps,
        });
        self.index.insert((kind, name.clone()), id);
        self.record_op(operation, &name, Disposition::Created);
        Ok(id)
    }

    fn require(&self, id: NodeId) -> Result<&PlanNode, ComposeError> {
        self.nodes.get(id.index()).ok_or_else(|| {
            ConfigurationError::UnresolvedNode {
                reference: id.to_string(),
            }
            .into()
        })
    }

    fn require_kind(&self, id: NodeId, kind: NodeKind) -> Result<&PlanNode, ComposeError> {
        let node = self.require(id)?;
        if node.kind != kind {
            return Err(ConfigurationError::KindMismatch {
                reference: node.name.clone(),
                expected: kind.as_str().to_string(),
                found: node.kind.as_str().to_string(),
            }
            .into());
        }
        Ok(node)
    }

    /// Project the current resource/method tree for deployment digesting,
    /// sorted by (kind, name) so the digest is canonical.
    fn tree_projection(&self) -> (Vec<(NodeKind, &String, &NodeRecord)>, Vec<NodeId>) {
        let mut entries: Vec<_> = self
            .nodes
            .iter()
            .filter(|n| {
                matches!(
                    n.kind,
                    NodeKind::RestApi | NodeKind::Resource | NodeKind::Method
                )
            })
            .collect();
        entries.sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
        let ids = entries.iter().map(|n| n.id).collect();
        let projection = entries
            .into_iter()
            .map(|n| (n.kind, &n.name, &n.record))
            .collect();
        (projection, ids)
    }
}

// ---------------------------------------------------------------------------
// Capability implementation
// ---------------------------------------------------------------------------

impl ProvisioningBackend for PlanBackend {
    fn create_rest_api(&mut self, name: &str) -> Result<RestApiHandle, ComposeError> {
        let node = self.upsert(
            name.to_string(),
            NodeRecord::RestApi {
                name: name.to_string(),
            },
            Vec::new(),
            "create-rest-api",
        )?;
        Ok(RestApiHandle {
            node,
            name: name.to_string(),
        })
    }

    fn create_resource(
        &mut self,
        parent: NodeId,
        segment: &PathSegment,
    ) -> Result<ResourceHandle, ComposeError> {
        let parent_node = self.require(parent)?;
        let parent_path = match &parent_node.record {
            NodeRecord::RestApi { .. } => String::new(),
            NodeRecord::Resource { path, .. } => path.clone(),
            _ => {
                return Err(ConfigurationError::KindMismatch {
                    reference: parent_node.name.clone(),
                    expected: "rest api or resource".to_string(),
                    found: parent_node.kind.as_str().to_string(),
                }
                .into())
            }
        };
        let path = format!("{parent_path}/{segment}");
        let node = self.upsert(
            path.clone(),
            NodeRecord::Resource {
                parent,
                segment: segment.clone(),
                path: path.clone(),
            },
            vec![parent],
            "create-resource",
        )?;
        Ok(ResourceHandle { node, path })
    }

    fn create_method(
        &mut self,
        resource: &ResourceHandle,
        verb: HttpVerb,
        operation: &OperationName,
        integration: &HandlerRef,
        options: MethodOptions,
    ) -> Result<MethodHandle, ComposeError> {
        self.require_kind(resource.node, NodeKind::Resource)?;
        let name = format!("{}/{}", resource.path, verb);
        let node = self.upsert(
            name,
            NodeRecord::Method {
                resource: resource.node,
                path: resource.path.clone(),
                verb,
                operation: operation.clone(),
                integration: integration.clone(),
                options,
            },
            vec![resource.node],
            "create-method",
        )?;
        Ok(MethodHandle {
            node,
            resource: resource.node,
            path: resource.path.clone(),
            verb,
            operation: operation.clone(),
            integration: integration.clone(),
        })
    }

    fn create_deployment(&mut self, api: &RestApiHandle) -> Result<DeploymentHandle, ComposeError> {
        self.require_kind(api.node, NodeKind::RestApi)?;
        let (projection, mut dep_ids) = self.tree_projection();
        let tree_digest = digest_of(&projection)?;
        if !dep_ids.contains(&api.node) {
            dep_ids.push(api.node);
        }
        let name = format!("deployment-{}", tree_digest.short());
        let node = self.upsert(
            name,
            NodeRecord::Deployment {
                api: api.node,
                tree_digest,
            },
            dep_ids,
            "create-deployment",
        )?;
        Ok(DeploymentHandle { node, tree_digest })
    }

    fn create_stage(
        &mut self,
        deployment: &DeploymentHandle,
        spec: &StageSpec,
    ) -> Result<StageHandle, ComposeError> {
        self.require_kind(deployment.node, NodeKind::Deployment)?;
        let node = self.upsert(
            spec.name.as_str().to_string(),
            NodeRecord::Stage {
                deployment: deployment.node,
                spec: spec.clone(),
            },
            vec![deployment.node],
            "create-stage",
        )?;
        self.stage_states.entry(node).or_insert(StageState::Deployed);
        Ok(StageHandle {
            node,
            name: spec.name.clone(),
        })
    }

    fn set_active_stage(
        &mut self,
        api: &RestApiHandle,
        stage: &StageHandle,
    ) -> Result<(), ComposeError> {
        self.require_kind(api.node, NodeKind::RestApi)?;
        self.require_kind(stage.node, NodeKind::Stage)?;

        match self.active_stages.get(&api.node).copied() {
            Some(current) if current == stage.node => {
                self.record_op("set-active-stage", stage.name.as_str(), Disposition::Replayed);
            }
            Some(previous) => {
                let previous_name = self.nodes[previous.index()].name.clone();
                tracing::warn!(
                    api = %api.name,
                    from = %previous_name,
                    to = %stage.name,
                    "reassigning active stage; last write wins"
                );
                self.stage_states.insert(previous, StageState::Deployed);
                self.stage_states.insert(stage.node, StageState::Active);
                self.active_stages.insert(api.node, stage.node);
                self.record_op("set-active-stage", stage.name.as_str(), Disposition::Created);
            }
            None => {
                self.stage_states.insert(stage.node, StageState::Active);
                self.active_stages.insert(api.node, stage.node);
                self.record_op("set-active-stage", stage.name.as_str(), Disposition::Created);
            }
        }
        Ok(())
    }

    fn create_api_key(
        &mut self,
        name: &str,
        value: &ApiKeyValue,
    ) -> Result<ApiKeyHandle, ComposeError> {
        let node = self.upsert(
            name.to_string(),
            NodeRecord::ApiKey {
                name: name.to_string(),
                value: value.clone(),
            },
            Vec::new(),
            "create-api-key",
        )?;
        Ok(ApiKeyHandle {
            node,
            name: name.to_string(),
        })
    }

    fn create_usage_plan(
        &mut self,
        name: &str,
        throttle: Throttle,
    ) -> Result<UsagePlanHandle, ComposeError> {
        let node = self.upsert(
            name.to_string(),
            NodeRecord::UsagePlan {
                name: name.to_string(),
                throttle,
            },
            Vec::new(),
            "create-usage-plan",
        )?;
        Ok(UsagePlanHandle {
            node,
            name: name.to_string(),
        })
    }

    fn bind_key_to_plan(
        &mut self,
        plan: &UsagePlanHandle,
        key: &ApiKeyHandle,
    ) -> Result<NodeId, ComposeError> {
        self.require_kind(plan.node, NodeKind::UsagePlan)?;
        self.require_kind(key.node, NodeKind::ApiKey)?;
        self.upsert(
            format!("{}:{}", plan.name, key.name),
            NodeRecord::PlanKeyBinding {
                plan: plan.node,
                key: key.node,
            },
            vec![plan.node, key.node],
            "bind-key-to-plan",
        )
    }

    fn bind_plan_to_stage(
        &mut self,
        plan: &UsagePlanHandle,
        stage: &StageHandle,
        overrides: &[MethodThrottle],
    ) -> Result<NodeId, ComposeError> {
        self.require_kind(plan.node, NodeKind::UsagePlan)?;
        self.require_kind(stage.node, NodeKind::Stage)?;
        self.upsert(
            format!("{}:{}", plan.name, stage.name),
            NodeRecord::PlanStageBinding {
                plan: plan.node,
                stage: stage.node,
                overrides: overrides.to_vec(),
            },
            vec![plan.node, stage.node],
            "bind-plan-to-stage",
        )
    }

    fn add_dependency(&mut self, from: NodeId, on: NodeId) -> Result<(), ComposeError> {
        self.require(from)?;
        self.require(on)?;
        let edge_name = format!("{from}->{on}");
        let deps = &mut self.nodes[from.index()].depends_on;
        if deps.contains(&on) {
            self.record_op("add-dependency", &edge_name, Disposition::Replayed);
        } else {
            deps.push(on);
            self.record_op("add-dependency", &edge_name, Disposition::Created);
        }
        Ok(())
    }

    fn resolve_invocation_scope(
        &mut self,
        stage: &StageHandle,
        verb_pattern: &str,
        path_pattern: &str,
    ) -> Result<InvocationScope, ComposeError> {
        let stage_node = self.require_kind(stage.node, NodeKind::Stage)?;
        let NodeRecord::Stage { deployment, .. } = &stage_node.record else {
            unreachable!("kind checked above");
        };
        let NodeRecord::Deployment { api, .. } = &self.nodes[deployment.index()].record else {
            return Err(ConfigurationError::UnresolvedNode {
                reference: deployment.to_string(),
            }
            .into());
        };
        let NodeRecord::RestApi { name: api_name } = &self.nodes[api.index()].record else {
            return Err(ConfigurationError::UnresolvedNode {
                reference: api.to_string(),
            }
            .into());
        };
        let scope = InvocationScope {
            stage: stage.name.clone(),
            verb_pattern: verb_pattern.to_string(),
            path_pattern: path_pattern.to_string(),
            source: format!(
                "gateway:{api_name}:{}/{verb_pattern}{path_pattern}",
                stage.name
            ),
        };
        self.record_op(
            "resolve-invocation-scope",
            &scope.source,
            Disposition::Replayed,
        );
        Ok(scope)
    }

    fn grant_invoke(
        &mut self,
        handler: &HandlerRef,
        principal: &str,
        scope: &InvocationScope,
        name: &str,
    ) -> Result<GrantHandle, ComposeError> {
        let stage_node = self
            .index
            .get(&(NodeKind::Stage, scope.stage.as_str().to_string()))
            .copied()
            .ok_or_else(|| ConfigurationError::UnresolvedNode {
                reference: scope.stage.as_str().to_string(),
            })?;
        let node = self.upsert(
            name.to_string(),
            NodeRecord::Grant {
                handler: handler.clone(),
                principal: principal.to_string(),
                scope: scope.clone(),
            },
            vec![stage_node],
            "grant-invoke-permission",
        )?;
        Ok(GrantHandle {
            node,
            name: name.to_string(),
            stage: scope.stage.clone(),
            handler: handler.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Supporting resource declarations
// ---------------------------------------------------------------------------

impl PlanBackend {
    /// Declare a work queue.
    pub fn declare_queue(
        &mut self,
        name: &str,
        visibility_timeout_secs: u32,
    ) -> Result<NodeId, ComposeError> {
        self.upsert(
            name.to_string(),
            NodeRecord::Queue {
                name: name.to_string(),
                visibility_timeout_secs,
            },
            Vec::new(),
            "declare-queue",
        )
    }

    /// Declare a fan-out topic.
    pub fn declare_topic(&mut self, name: &str) -> Result<NodeId, ComposeError> {
        self.upsert(
            name.to_string(),
            NodeRecord::Topic {
                name: name.to_string(),
            },
            Vec::new(),
            "declare-topic",
        )
    }

    /// Subscribe a queue to a topic. The subscription depends on both.
    pub fn declare_subscription(
        &mut self,
        topic: NodeId,
        queue: NodeId,
    ) -> Result<NodeId, ComposeError> {
        let topic_name = self.require_kind(topic, NodeKind::Topic)?.name.clone();
        let queue_name = self.require_kind(queue, NodeKind::Queue)?.name.clone();
        self.upsert(
            format!("{topic_name}:{queue_name}"),
            NodeRecord::Subscription { topic, queue },
            vec![topic, queue],
            "declare-subscription",
        )
    }

    /// Declare a callback-style task flow handled by `handler`.
    pub fn declare_task_flow(
        &mut self,
        name: &str,
        handler: &HandlerRef,
        completion_timeout_secs: u32,
    ) -> Result<NodeId, ComposeError> {
        self.upsert(
            name.to_string(),
            NodeRecord::TaskFlow {
                name: name.to_string(),
                handler: handler.clone(),
                completion_timeout_secs,
            },
            Vec::new(),
            "declare-task-flow",
        )
    }

    /// Declare a delivery pipeline: source plus synthesis commands.
    pub fn declare_delivery_pipeline(
        &mut self,
        name: &str,
        connection: &str,
        repository: &str,
        branch: &str,
        synth_commands: Vec<String>,
    ) -> Result<NodeId, ComposeError> {
        self.upsert(
            name.to_string(),
            NodeRecord::DeliveryPipeline {
                name: name.to_string(),
                connection: connection.to_string(),
                repository: repository.to_string(),
                branch: branch.to_string(),
                synth_commands,
            },
            Vec::new(),
            "declare-delivery-pipeline",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::config::FrontendConfig;
    use portico_core::gateway::LoggingLevel;

    // ---- fixtures ----

    fn api(backend: &mut PlanBackend) -> RestApiHandle {
        backend.create_rest_api("some-service").unwrap()
    }

    fn segment(s: &str) -> PathSegment {
        PathSegment::new(s).unwrap()
    }

    fn handler(addr: &str) -> HandlerRef {
        HandlerRef::new(addr).unwrap()
    }

    fn dev_stage_spec() -> StageSpec {
        FrontendConfig::standard().tiers[0].stage.clone()
    }

    fn prod_stage_spec() -> StageSpec {
        FrontendConfig::standard().tiers[1].stage.clone()
    }

    /// Build api → /svc/things tree with one GET method and a deployment.
    fn provisioned_deployment(
        backend: &mut PlanBackend,
    ) -> (RestApiHandle, MethodHandle, DeploymentHandle) {
        let api = api(backend);
        let svc = backend.create_resource(api.root(), &segment("svc")).unwrap();
        let things = backend.create_resource(svc.node, &segment("things")).unwrap();
        let method = backend
            .create_method(
                &things,
                HttpVerb::Get,
                &OperationName::new("listThings").unwrap(),
                &handler("handler://svc/list-things"),
                MethodOptions::credential_required(),
            )
            .unwrap();
        let deployment = backend.create_deployment(&api).unwrap();
        (api, method, deployment)
    }

    // ---- resources and methods ----

    #[test]
    fn resource_paths_nest_under_parents() {
        let mut backend = PlanBackend::new();
        let api = api(&mut backend);
        let svc = backend.create_resource(api.root(), &segment("svc")).unwrap();
        let things = backend.create_resource(svc.node, &segment("things")).unwrap();
        assert_eq!(svc.path, "/svc");
        assert_eq!(things.path, "/svc/things");
    }

    #[test]
    fn identical_resource_recreation_is_idempotent() {
        let mut backend = PlanBackend::new();
        let api = api(&mut backend);
        let first = backend.create_resource(api.root(), &segment("svc")).unwrap();
        let second = backend.create_resource(api.root(), &segment("svc")).unwrap();
        assert_eq!(first.node, second.node);
        assert_eq!(backend.node_count(), 2); // api + one resource
    }

    #[test]
    fn conflicting_method_recreation_collides() {
        let mut backend = PlanBackend::new();
        let (_, method, _) = provisioned_deployment(&mut backend);
        let things = ResourceHandle {
            node: method.resource,
            path: method.path.clone(),
        };
        let err = backend
            .create_method(
                &things,
                HttpVerb::Get,
                &OperationName::new("listThings").unwrap(),
                &handler("handler://svc/other"),
                MethodOptions::credential_required(),
            )
            .unwrap_err();
        match err {
            ComposeError::Configuration(ConfigurationError::NameCollision { name, .. }) => {
                assert_eq!(name, "/svc/things/GET");
            }
            other => panic!("expected name collision, got {other:?}"),
        }
    }

    #[test]
    fn method_creation_requires_resource_kind() {
        let mut backend = PlanBackend::new();
        let api = api(&mut backend);
        let bogus = ResourceHandle {
            node: api.node,
            path: "/".into(),
        };
        let err = backend
            .create_method(
                &bogus,
                HttpVerb::Get,
                &OperationName::new("listThings").unwrap(),
                &handler("handler://svc/list"),
                MethodOptions::credential_required(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ComposeError::Configuration(ConfigurationError::KindMismatch { .. })
        ));
    }

    // ---- keys and plans ----

    #[test]
    fn api_key_upsert_is_idempotent_and_conflict_names_key() {
        let mut backend = PlanBackend::new();
        let value = ApiKeyValue::new("dev-tier-shared-access-key-0001").unwrap();
        let first = backend.create_api_key("devApiKey", &value).unwrap();
        let replay = backend.create_api_key("devApiKey", &value).unwrap();
        assert_eq!(first.node, replay.node);
        assert_eq!(backend.node_count(), 1);

        let other = ApiKeyValue::new("public-tier-default-access-key-0001").unwrap();
        let err = backend.create_api_key("devApiKey", &other).unwrap_err();
        assert!(err.to_string().contains("devApiKey"));
    }

    #[test]
    fn replayed_calls_are_journaled_as_replays() {
        let mut backend = PlanBackend::new();
        let value = ApiKeyValue::new("dev-tier-shared-access-key-0001").unwrap();
        backend.create_api_key("devApiKey", &value).unwrap();
        backend.create_api_key("devApiKey", &value).unwrap();
        let dispositions: Vec<_> = backend
            .journal()
            .iter()
            .filter(|op| op.operation == "create-api-key")
            .map(|op| op.disposition)
            .collect();
        assert_eq!(dispositions, vec![Disposition::Created, Disposition::Replayed]);
    }

    // ---- stage lifecycle ----

    #[test]
    fn created_stage_starts_deployed() {
        let mut backend = PlanBackend::new();
        let (_, _, deployment) = provisioned_deployment(&mut backend);
        let stage = backend.create_stage(&deployment, &dev_stage_spec()).unwrap();
        assert_eq!(backend.stage_state(stage.node), Some(StageState::Deployed));
    }

    #[test]
    fn active_stage_reassignment_is_last_write_wins() {
        let mut backend = PlanBackend::new();
        let (api, _, deployment) = provisioned_deployment(&mut backend);
        let dev = backend.create_stage(&deployment, &dev_stage_spec()).unwrap();
        let prod = backend.create_stage(&deployment, &prod_stage_spec()).unwrap();

        backend.set_active_stage(&api, &dev).unwrap();
        assert_eq!(backend.active_stage_of(api.node), Some(dev.node));
        assert_eq!(backend.stage_state(dev.node), Some(StageState::Active));

        backend.set_active_stage(&api, &prod).unwrap();
        assert_eq!(backend.active_stage_of(api.node), Some(prod.node));
        assert_eq!(backend.stage_state(prod.node), Some(StageState::Active));
        // The previous holder is reassigned, not duplicated.
        assert_eq!(backend.stage_state(dev.node), Some(StageState::Deployed));
    }

    #[test]
    fn reasserting_the_same_active_stage_is_a_replay() {
        let mut backend = PlanBackend::new();
        let (api, _, deployment) = provisioned_deployment(&mut backend);
        let prod = backend.create_stage(&deployment, &prod_stage_spec()).unwrap();
        backend.set_active_stage(&api, &prod).unwrap();
        backend.set_active_stage(&api, &prod).unwrap();
        let dispositions: Vec<_> = backend
            .journal()
            .iter()
            .filter(|op| op.operation == "set-active-stage")
            .map(|op| op.disposition)
            .collect();
        assert_eq!(dispositions, vec![Disposition::Created, Disposition::Replayed]);
    }

    // ---- dependencies ----

    #[test]
    fn dependency_edge_to_unknown_node_is_unresolved() {
        let mut backend = PlanBackend::new();
        let api = api(&mut backend);
        let err = backend.add_dependency(api.node, NodeId::new(99)).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::Configuration(ConfigurationError::UnresolvedNode { .. })
        ));
    }

    #[test]
    fn duplicate_dependency_edges_are_replayed() {
        let mut backend = PlanBackend::new();
        let (_, method, deployment) = provisioned_deployment(&mut backend);
        backend.add_dependency(deployment.node, method.node).unwrap();
        backend.add_dependency(deployment.node, method.node).unwrap();
        let node = backend.node(deployment.node).unwrap();
        let count = node.depends_on.iter().filter(|d| **d == method.node).count();
        assert_eq!(count, 1);
    }

    // ---- scopes and grants ----

    #[test]
    fn scope_resolution_walks_back_to_the_api_name() {
        let mut backend = PlanBackend::new();
        let (_, _, deployment) = provisioned_deployment(&mut backend);
        let prod = backend.create_stage(&deployment, &prod_stage_spec()).unwrap();
        let scope = backend.resolve_invocation_scope(&prod, "*", "/*").unwrap();
        assert_eq!(scope.source, "gateway:some-service:prod-v1/*/*");
        assert_eq!(scope.stage.as_str(), "prod-v1");
    }

    #[test]
    fn grant_with_unresolved_stage_fails() {
        let mut backend = PlanBackend::new();
        provisioned_deployment(&mut backend);
        let forged = InvocationScope {
            stage: portico_core::identifier::StageName::new("ghost").unwrap(),
            verb_pattern: "*".into(),
            path_pattern: "/*".into(),
            source: "gateway:some-service:ghost/*/*".into(),
        };
        let err = backend
            .grant_invoke(&handler("handler://svc/list"), "gateway.portico.internal", &forged, "g0")
            .unwrap_err();
        match err {
            ComposeError::Configuration(ConfigurationError::UnresolvedNode { reference }) => {
                assert_eq!(reference, "ghost");
            }
            other => panic!("expected unresolved node, got {other:?}"),
        }
    }

    #[test]
    fn grants_depend_on_their_stage() {
        let mut backend = PlanBackend::new();
        let (_, _, deployment) = provisioned_deployment(&mut backend);
        let prod = backend.create_stage(&deployment, &prod_stage_spec()).unwrap();
        let scope = backend.resolve_invocation_scope(&prod, "*", "/*").unwrap();
        let grant = backend
            .grant_invoke(&handler("handler://svc/list"), "gateway.portico.internal", &scope, "g0")
            .unwrap();
        let node = backend.node(grant.node).unwrap();
        assert!(node.depends_on.contains(&prod.node));
    }

    // ---- deployments ----

    #[test]
    fn deployment_names_derive_from_the_tree_digest() {
        let mut one = PlanBackend::new();
        let mut two = PlanBackend::new();
        let (_, _, d1) = provisioned_deployment(&mut one);
        let (_, _, d2) = provisioned_deployment(&mut two);
        assert_eq!(
            one.node(d1.node).unwrap().name,
            two.node(d2.node).unwrap().name
        );
        assert_eq!(d1.tree_digest, d2.tree_digest);
    }

    #[test]
    fn tree_changes_change_the_deployment_digest() {
        let mut backend = PlanBackend::new();
        let (api, _, first) = provisioned_deployment(&mut backend);
        backend
            .create_resource(api.root(), &segment("extra"))
            .unwrap();
        let second = backend.create_deployment(&api).unwrap();
        assert_ne!(first.tree_digest, second.tree_digest);
        assert_ne!(first.node, second.node);
    }

    // ---- supporting resources ----

    #[test]
    fn subscription_requires_topic_and_queue_kinds() {
        let mut backend = PlanBackend::new();
        let queue = backend.declare_queue("work", 300).unwrap();
        let topic = backend.declare_topic("events").unwrap();

        let sub = backend.declare_subscription(topic, queue).unwrap();
        let node = backend.node(sub).unwrap();
        assert!(node.depends_on.contains(&topic) && node.depends_on.contains(&queue));

        let err = backend.declare_subscription(queue, topic).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::Configuration(ConfigurationError::KindMismatch { .. })
        ));
    }

    #[test]
    fn stage_spec_literals_flow_into_the_record() {
        let mut backend = PlanBackend::new();
        let (_, _, deployment) = provisioned_deployment(&mut backend);
        let dev = backend.create_stage(&deployment, &dev_stage_spec()).unwrap();
        match &backend.node(dev.node).unwrap().record {
            NodeRecord::Stage { spec, .. } => {
                assert_eq!(spec.logging, LoggingLevel::Info);
                assert_eq!(spec.throttle, Throttle::new(1000, 200));
                assert!(!spec.caching_enabled);
            }
            other => panic!("expected stage record, got {other:?}"),
        }
    }
}
