//! Polling-trigger watermark port (spec §6).

use async_trait::async_trait;
use engine_core::{NodeId, WorkflowId};
use serde_json::Value;

use crate::error::PortsError;

/// Persists and retrieves the opaque "last modified data" watermark a
/// polling trigger uses to avoid reprocessing the same remote entities.
#[async_trait]
pub trait ExecutorScheduleManager: Send + Sync {
    /// Fetch the stored watermark for a trigger node, if any.
    async fn get_last_modified_data(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
    ) -> Result<Option<Value>, PortsError>;

    /// Overwrite the stored watermark for a trigger node.
    async fn set_last_modified_data(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        data: Value,
    ) -> Result<(), PortsError>;
}
