//! Per-execution context and result (spec §4.1/§6).

use std::collections::HashMap;

use engine_core::{ExecutionId, NodeId, UserId, WorkflowId, WorkspaceId};
use engine_events::HistoryEntry;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

/// Ambient, per-execution carrier passed alongside the cancellation token.
///
/// Holds the identifiers and flags every node may read, plus the mutable
/// response fields a node (e.g. a "respond-webhook" action) may write to.
/// Not serializable -- this is runtime-only state, unlike the persisted
/// [`HistoryEntry`] records it ultimately produces.
#[derive(Debug)]
pub struct WorkflowExecutionContext {
    pub user_id: UserId,
    pub workspace_id: WorkspaceId,
    pub workflow_id: WorkflowId,
    pub execution_id: ExecutionId,
    pub input_payload: Vec<u8>,
    pub trigger_node_id: Option<NodeId>,
    pub is_testing: bool,
    pub is_re_execution: bool,
    pub cancellation: CancellationToken,
    response_payload: RwLock<Option<Vec<u8>>>,
    response_headers: RwLock<HashMap<String, String>>,
    response_status_code: RwLock<Option<u16>>,
}

impl WorkflowExecutionContext {
    #[must_use]
    pub fn new(
        user_id: UserId,
        workspace_id: WorkspaceId,
        workflow_id: WorkflowId,
        execution_id: ExecutionId,
        input_payload: Vec<u8>,
        trigger_node_id: Option<NodeId>,
        is_testing: bool,
        is_re_execution: bool,
    ) -> Self {
        Self {
            user_id,
            workspace_id,
            workflow_id,
            execution_id,
            input_payload,
            trigger_node_id,
            is_testing,
            is_re_execution,
            cancellation: CancellationToken::new(),
            response_payload: RwLock::new(None),
            response_headers: RwLock::new(HashMap::new()),
            response_status_code: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn set_response_payload(&self, payload: Vec<u8>) {
        *self.response_payload.write() = Some(payload);
    }

    #[must_use]
    pub fn response_payload(&self) -> Option<Vec<u8>> {
        self.response_payload.read().clone()
    }

    pub fn set_response_header(&self, key: impl Into<String>, value: impl Into<String>) {
        self.response_headers.write().insert(key.into(), value.into());
    }

    #[must_use]
    pub fn response_headers(&self) -> HashMap<String, String> {
        self.response_headers.read().clone()
    }

    pub fn set_response_status_code(&self, code: u16) {
        *self.response_status_code.write() = Some(code);
    }

    #[must_use]
    pub fn response_status_code(&self) -> Option<u16> {
        *self.response_status_code.read()
    }
}

/// Everything `Execute` returns (spec §4.1 step 3).
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub response_payload: Option<Vec<u8>>,
    pub response_headers: HashMap<String, String>,
    pub response_status_code: Option<u16>,
    pub history_entries: Vec<HistoryEntry>,
}
