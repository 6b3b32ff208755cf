//! Process-wide registry of in-flight executions (spec §5 `[ADDED]`).
//!
//! Mirrors the teacher's registry-by-`DashMap` convention (`ActionRegistry`,
//! credential registries): a flat map from execution id to the
//! [`CancellationToken`] that call's [`engine_execution::WorkflowExecutionContext`]
//! was built with, so a transport layer can cancel an execution by id
//! without holding a reference to the in-flight future.

use dashmap::DashMap;
use engine_core::ExecutionId;
use engine_events::EventStream;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Tracks every execution currently running through this process.
#[derive(Default)]
pub struct ExecutionRegistry {
    tokens: DashMap<ExecutionId, CancellationToken>,
    streams: DashMap<ExecutionId, EventStream>,
}

impl ExecutionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly started execution, returning the token to hand
    /// to its [`engine_execution::WorkflowExecutionContext`].
    pub fn start(&self, execution_id: ExecutionId) -> CancellationToken {
        let token = CancellationToken::new();
        self.tokens.insert(execution_id, token.clone());
        token
    }

    /// Drop the bookkeeping for a finished execution.
    pub fn finish(&self, execution_id: ExecutionId) {
        self.tokens.remove(&execution_id);
        self.streams.remove(&execution_id);
    }

    /// Register the event stream handle of a freshly built `Executor`, so a
    /// caller can later subscribe to it by execution id alone.
    pub fn register_stream(&self, execution_id: ExecutionId, stream: EventStream) {
        self.streams.insert(execution_id, stream);
    }

    /// Subscribe to a tracked execution's best-effort event stream. Returns
    /// `None` if `execution_id` is not currently tracked.
    #[must_use]
    pub fn subscribe_stream(&self, execution_id: ExecutionId) -> Option<broadcast::Receiver<engine_events::ExecutionEvent>> {
        self.streams.get(&execution_id).map(|stream| stream.subscribe())
    }

    /// Cancel a tracked execution. Returns `true` if it was found.
    pub fn cancel(&self, execution_id: ExecutionId) -> bool {
        match self.tokens.get(&execution_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Number of executions currently tracked.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tokens.len()
    }
}
