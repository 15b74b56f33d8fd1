//! # Sealed Provisioning Plan
//!
//! [`ProvisioningPlan`] is the immutable artifact a [`PlanBackend`] seals
//! into: every recorded node, a dependency-respecting build order, the
//! active-stage assignment per API, and a canonical content digest.
//!
//! ## Determinism
//!
//! Two plans sealed from the same input spec are byte-for-byte identical in
//! everything the digest covers. The digest is computed over the (kind,
//! name, record) projection sorted by (kind, name) plus the active-stage
//! map — physical ids are excluded, so re-synthesis with fresh physical ids
//! reproduces the same digest.
//!
//! The build order is first-class: Kahn's algorithm over the dependency
//! edges, breaking ties toward the smallest node id so the order is stable
//! across runs rather than an accident of iteration.
//!
//! [`PlanBackend`]: crate::memory::PlanBackend

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use portico_core::digest::{digest_of, ContentDigest};
use portico_core::error::{ComposeError, ConfigurationError};
use portico_core::identifier::StageName;

use crate::node::{NodeId, NodeKind, NodeRecord, PlanNode};

/// An immutable, validated, ordered provisioning plan.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningPlan {
    nodes: Vec<PlanNode>,
    build_order: Vec<NodeId>,
    active_stages: BTreeMap<String, StageName>,
    digest: ContentDigest,
}

impl ProvisioningPlan {
    /// Validate and order a recorded graph.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::UnresolvedNode`] when an edge references a
    ///   node outside the graph.
    /// - [`ConfigurationError::DependencyCycle`] when no build order exists;
    ///   the error names the smallest node still blocked.
    pub(crate) fn seal(
        nodes: Vec<PlanNode>,
        active_stages: BTreeMap<String, StageName>,
    ) -> Result<Self, ComposeError> {
        for node in &nodes {
            for dep in &node.depends_on {
                if dep.index() >= nodes.len() {
                    return Err(ConfigurationError::UnresolvedNode {
                        reference: dep.to_string(),
                    }
                    .into());
                }
            }
        }

        let build_order = toposort(&nodes)?;
        let digest = digest_of(&(projection(&nodes), &active_stages))?;
        tracing::debug!(
            nodes = nodes.len(),
            digest = %digest,
            "sealed provisioning plan"
        );

        Ok(Self {
            nodes,
            build_order,
            active_stages,
            digest,
        })
    }

    /// All nodes, in creation order.
    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&PlanNode> {
        self.nodes.get(id.index())
    }

    /// Number of nodes of one kind.
    pub fn count_of(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    /// Look up a node by (kind, logical name).
    pub fn find(&self, kind: NodeKind, name: &str) -> Option<&PlanNode> {
        self.nodes.iter().find(|n| n.kind == kind && n.name == name)
    }

    /// All nodes of one kind, in creation order.
    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &PlanNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// Dependency-respecting build order over every node.
    pub fn build_order(&self) -> &[NodeId] {
        &self.build_order
    }

    /// Position of a node within the build order.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.build_order.iter().position(|n| *n == id)
    }

    /// Canonical content digest; stable across re-synthesis.
    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }

    /// Active stage assigned to an API, by API name.
    pub fn active_stage(&self, api: &str) -> Option<&StageName> {
        self.active_stages.get(api)
    }

    /// Every active-stage assignment, keyed by API name.
    pub fn active_stages(&self) -> &BTreeMap<String, StageName> {
        &self.active_stages
    }

    /// Compare two plans by (kind, logical name), ignoring physical ids.
    pub fn diff(&self, other: &ProvisioningPlan) -> PlanDiff {
        let mine: BTreeMap<_, _> = self
            .nodes
            .iter()
            .map(|n| ((n.kind, n.name.as_str()), &n.record))
            .collect();
        let theirs: BTreeMap<_, _> = other
            .nodes
            .iter()
            .map(|n| ((n.kind, n.name.as_str()), &n.record))
            .collect();

        let mut diff = PlanDiff::default();
        for (&(kind, name), record) in &mine {
            match theirs.get(&(kind, name)) {
                None => diff.added.push(DiffEntry::new(kind, name)),
                Some(other_record) if *other_record != *record => {
                    diff.changed.push(DiffEntry::new(kind, name));
                }
                Some(_) => {}
            }
        }
        for &(kind, name) in theirs.keys() {
            if !mine.contains_key(&(kind, name)) {
                diff.removed.push(DiffEntry::new(kind, name));
            }
        }
        diff
    }
}

/// One (kind, name) slot that differs between two plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    pub kind: NodeKind,
    pub name: String,
}

impl DiffEntry {
    fn new(kind: NodeKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
        }
    }
}

impl std::fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.kind.as_str(), self.name)
    }
}

/// Difference between two plans, keyed by (kind, logical name).
///
/// Entries are ordered by (kind, name), inherited from the sorted maps
/// they are drawn from, so diff output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanDiff {
    /// Present in `self`, absent in `other`.
    pub added: Vec<DiffEntry>,
    /// Absent in `self`, present in `other`.
    pub removed: Vec<DiffEntry>,
    /// Present in both with differing records.
    pub changed: Vec<DiffEntry>,
}

impl PlanDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// (kind, name, record) view of the graph, sorted by (kind, name).
/// Physical ids and edge lists stay out of the digest.
fn projection(nodes: &[PlanNode]) -> Vec<(NodeKind, &String, &NodeRecord)> {
    let mut entries: Vec<_> = nodes
        .iter()
        .map(|n| (n.kind, &n.name, &n.record))
        .collect();
    entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    entries
}

/// Kahn's algorithm with a sorted ready set: when several nodes are
/// unblocked, the smallest id goes first, so the order never depends on
/// hash iteration.
fn toposort(nodes: &[PlanNode]) -> Result<Vec<NodeId>, ConfigurationError> {
    let mut indegree = vec![0usize; nodes.len()];
    let mut dependents: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
    for node in nodes {
        for dep in &node.depends_on {
            indegree[node.id.index()] += 1;
            dependents[dep.index()].push(node.id);
        }
    }

    let mut ready: BTreeSet<NodeId> = nodes
        .iter()
        .filter(|n| indegree[n.id.index()] == 0)
        .map(|n| n.id)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(id) = ready.pop_first() {
        order.push(id);
        for &dependent in &dependents[id.index()] {
            indegree[dependent.index()] -= 1;
            if indegree[dependent.index()] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() != nodes.len() {
        let blocked = nodes
            .iter()
            .find(|n| indegree[n.id.index()] > 0)
            .map_or_else(|| "unknown".to_string(), |n| n.name.clone());
        return Err(ConfigurationError::DependencyCycle { node: blocked });
    }
    Ok(order)
}
