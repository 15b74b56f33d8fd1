//! # Supporting Resource Composition
//!
//! The resources around the API front end: an event channel (work queue,
//! fan-out topic, subscription), a callback-style task flow, and an
//! optional delivery pipeline. These are single declarations with
//! dependency edges, recorded into the in-memory plan alongside the
//! gateway graph but independent of the five-stage pipeline.

use serde::{Deserialize, Serialize};

use portico_core::error::ComposeError;
use portico_core::identifier::HandlerRef;
use portico_plan::memory::PlanBackend;
use portico_plan::node::NodeId;

/// Declarations for the supporting resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportSpec {
    /// Work queue name.
    pub queue_name: String,
    /// Queue message visibility timeout, seconds.
    pub visibility_timeout_secs: u32,
    /// Fan-out topic name; the queue is subscribed to it.
    pub topic_name: String,
    /// Callback task-flow name.
    pub task_flow_name: String,
    /// Handler the task flow calls back into.
    pub task_handler: HandlerRef,
    /// Task completion timeout, seconds.
    pub completion_timeout_secs: u32,
    /// Delivery pipeline, when the deployment is pipeline-driven.
    pub pipeline: Option<PipelineSpec>,
}

/// Source and synthesis declaration for the delivery pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub name: String,
    /// Named connection to the source host.
    pub connection: String,
    /// `owner/repo` source repository.
    pub repository: String,
    pub branch: String,
    /// Commands that produce the plan artifact.
    pub synth_commands: Vec<String>,
}

impl SupportSpec {
    /// The standard wiring: 300-second queue visibility, one topic, the
    /// callback flow, and a main-branch delivery pipeline.
    pub fn standard() -> Self {
        Self {
            queue_name: "portico-work-queue".to_string(),
            visibility_timeout_secs: 300,
            topic_name: "portico-events".to_string(),
            task_flow_name: "portico-callback-flow".to_string(),
            task_handler: HandlerRef::new("handler://portico/callbacks")
                .expect("fixed support table literals are valid"),
            completion_timeout_secs: 3600,
            pipeline: Some(PipelineSpec {
                name: "portico-delivery".to_string(),
                connection: "portico-source-connection".to_string(),
                repository: "portico-gw/portico".to_string(),
                branch: "main".to_string(),
                synth_commands: vec![
                    "cargo build --release".to_string(),
                    "portico synth --app app.yaml --out plan.json".to_string(),
                ],
            }),
        }
    }
}

/// Nodes declared for the supporting resources.
#[derive(Debug, Clone)]
pub struct SupportOutputs {
    pub queue: NodeId,
    pub topic: NodeId,
    pub subscription: NodeId,
    pub task_flow: NodeId,
    pub pipeline: Option<NodeId>,
}

/// Declare the supporting resources into the plan.
///
/// Takes the concrete in-memory backend: support wiring is plan-side
/// declaration, not part of the backend capability surface.
pub fn compose_support(
    backend: &mut PlanBackend,
    spec: &SupportSpec,
) -> Result<SupportOutputs, ComposeError> {
    let queue = backend.declare_queue(&spec.queue_name, spec.visibility_timeout_secs)?;
    let topic = backend.declare_topic(&spec.topic_name)?;
    let subscription = backend.declare_subscription(topic, queue)?;
    let task_flow = backend.declare_task_flow(
        &spec.task_flow_name,
        &spec.task_handler,
        spec.completion_timeout_secs,
    )?;
    let pipeline = match &spec.pipeline {
        Some(p) => Some(backend.declare_delivery_pipeline(
            &p.name,
            &p.connection,
            &p.repository,
            &p.branch,
            p.synth_commands.clone(),
        )?),
        None => None,
    };

    tracing::info!(
        queue = %spec.queue_name,
        topic = %spec.topic_name,
        pipeline = spec.pipeline.is_some(),
        "composed supporting resources"
    );

    Ok(SupportOutputs {
        queue,
        topic,
        subscription,
        task_flow,
        pipeline,
    })
}
