//! # portico-plan — Provisioning Graph and Backend Capability
//!
//! Defines the trait-based provisioning backend abstraction and the
//! in-memory plan graph the composers record into.
//!
//! ## Architecture
//!
//! - **Backend** (`backend.rs`): The `ProvisioningBackend` trait is the
//!   capability surface composition is written against. Composers hold
//!   `&mut dyn ProvisioningBackend` and never assume what sits behind it.
//!
//! - **Memory** (`memory.rs`): `PlanBackend` is the canonical
//!   implementation. Every capability call becomes a node keyed by
//!   (kind, logical name); identical re-creation is an idempotent no-op,
//!   conflicting re-creation is a name collision. Stage lifecycle state
//!   and the per-API active-stage pointer live beside the graph, and a
//!   journal records every call.
//!
//! - **Nodes** (`node.rs`): `NodeId`, `NodeKind`, and the serialized
//!   `NodeRecord` content of every node. Logical names are deterministic;
//!   physical ids are per-run and excluded from digests.
//!
//! - **Handles** (`handle.rs`): Typed proofs of creation. Operations that
//!   need a stage take a `StageHandle`, so "grant before stage exists"
//!   fails at the type level rather than at provisioning time.
//!
//! - **Plan** (`plan.rs`): `ProvisioningPlan` seals the graph: edges
//!   validated, a deterministic dependency-respecting build order
//!   computed, a canonical content digest taken, diffs by (kind, name).
//!
//! ## Crate Policy
//!
//! - Depends on `portico-core` internally.
//! - Composition is construction-time and single-threaded; the backend
//!   trait takes `&mut self` and nothing here spawns or locks.
//! - No `unsafe`.

pub mod backend;
pub mod handle;
pub mod memory;
pub mod node;
pub mod plan;

pub use backend::ProvisioningBackend;
pub use handle::{
    ApiKeyHandle, DeploymentHandle, GrantHandle, InvocationScope, MethodHandle, ResourceHandle,
    RestApiHandle, StageHandle, UsagePlanHandle,
};
pub use memory::{Disposition, OperationRecord, PlanBackend, StageState};
pub use node::{NodeId, NodeKind, NodeRecord, PlanNode};
pub use plan::{DiffEntry, PlanDiff, ProvisioningPlan};
