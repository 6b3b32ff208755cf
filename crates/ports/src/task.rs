//! Asynchronous workflow-task dispatch port (spec §6).
//!
//! Used by polling triggers to hand off newly-discovered work for later
//! execution, rather than running the downstream workflow inline.

use async_trait::async_trait;
use engine_core::{NodeId, UserId, WorkflowId, WorkspaceId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PortsError;

/// A unit of deferred work: "run this workflow from this node with this
/// payload".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteWorkflowTask {
    pub workspace_id: WorkspaceId,
    pub workflow_id: WorkflowId,
    pub user_id: UserId,
    pub workflow_type: String,
    pub from_node_id: NodeId,
    pub payload: Vec<Map<String, Value>>,
}

/// Enqueues [`ExecuteWorkflowTask`]s for asynchronous dispatch.
#[async_trait]
pub trait ExecutorTaskPublisher: Send + Sync {
    async fn enqueue(&self, task: ExecuteWorkflowTask) -> Result<(), PortsError>;
}
