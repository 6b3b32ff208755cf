//! Event publishing ports (spec §6).
//!
//! These are the structured event shapes the core emits. `engine-events`
//! reuses [`PublishedEvent`] as its own `Observer`/`ExecutionBroker`
//! payload, so an event is built once and fans out unchanged to both the
//! in-process synchronous subscribers and the external publisher ports.

use async_trait::async_trait;
use engine_core::{ExecutionId, NodeId, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PortsError;

/// Emitted when a node begins executing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecutionStartedEvent {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub node_id: NodeId,
    pub is_re_execution: bool,
}

/// Emitted when a node completes successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecutedEvent {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub node_id: NodeId,
    /// Strictly increasing, contiguous, 1-based ordinal across the whole
    /// execution (spec §8 invariant 3).
    pub ordinal: u32,
    pub output_items_by_index: Vec<(u32, Vec<Map<String, Value>>)>,
}

/// Emitted when a node fails and the failure is not absorbed as an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeFailedEvent {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub node_id: NodeId,
    pub message: String,
}

/// Emitted exactly once per `Execute` call (spec §8 invariant 4).
///
/// `nodes_completed`/`nodes_failed` are running totals the broadcaster
/// accumulates from the `NodeExecuted`/`NodeFailed` events it has already
/// forwarded for this execution -- the terminal event itself carries no
/// node-level detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecutionCompletedEvent {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub nodes_completed: u32,
    pub nodes_failed: u32,
}

/// The four event shapes the core publishes, as a single wire enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum PublishedEvent {
    NodeExecutionStarted(NodeExecutionStartedEvent),
    NodeExecuted(NodeExecutedEvent),
    NodeFailed(NodeFailedEvent),
    WorkflowExecutionCompleted(WorkflowExecutionCompletedEvent),
}

/// Ordered delivery of structured execution events to an external sink.
///
/// Publish failures are transient by convention (spec §7
/// `TransientPublishError`): the caller logs and moves on, it never aborts
/// the execution loop over a publish failure.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event. Implementations must preserve call order for a
    /// single execution id.
    async fn publish(&self, event: PublishedEvent) -> Result<(), PortsError>;
}

/// Lifecycle for the secondary, best-effort event stream (spec §4.4/§6).
#[async_trait]
pub trait StreamEventPublisher: Send + Sync {
    /// Open the stream for one execution. Called once, before any events.
    async fn initialize(&self, execution_id: ExecutionId) -> Result<(), PortsError>;

    /// Publish one event onto the stream.
    async fn publish(&self, execution_id: ExecutionId, event: PublishedEvent)
    -> Result<(), PortsError>;

    /// Close the stream. Called exactly once, even on cancellation.
    async fn close(&self, execution_id: ExecutionId) -> Result<(), PortsError>;
}
