//! Control-plane notification port (spec §6).

use async_trait::async_trait;
use engine_core::{ExecutionId, NodeId, WorkflowId, WorkspaceId};
use serde::{Deserialize, Serialize};

use crate::error::PortsError;

/// One node execution record as reported to the control plane, mirroring
/// what `UsageCollector` accumulates (spec §4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecutionSummary {
    pub node_id: NodeId,
    pub ordinal: u32,
    pub input_item_count: usize,
    pub output_item_count: usize,
    pub integration_type: String,
    pub action_type: String,
    /// Milliseconds since the Unix epoch.
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
}

/// One history entry, mirroring `HistoryRecorder` (spec §4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntrySummary {
    pub node_id: NodeId,
    pub ordinal: u32,
    pub succeeded: bool,
    /// Set only when `succeeded` is `false`.
    pub error: Option<String>,
}

/// Final report handed to the control plane when an execution finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteWorkflowExecutionRequest {
    pub execution_id: ExecutionId,
    pub workspace_id: WorkspaceId,
    pub workflow_id: WorkflowId,
    pub trigger_node_id: Option<NodeId>,
    /// Milliseconds since the Unix epoch. Stamped by the caller -- this
    /// crate does not read the system clock itself.
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
    pub node_executions: Vec<NodeExecutionSummary>,
    pub history_entries: Vec<HistoryEntrySummary>,
    pub is_testing: bool,
}

/// Notifies an external control plane that an execution has finished.
#[async_trait]
pub trait ControlPlaneClient: Send + Sync {
    async fn complete_workflow_execution(
        &self,
        request: CompleteWorkflowExecutionRequest,
    ) -> Result<(), PortsError>;
}
