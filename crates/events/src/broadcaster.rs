//! Event broadcaster standard subscriber (spec §4.5).
//!
//! Forwards each [`ExecutionEvent`] to an external [`EventPublisher`] port,
//! enriched with workflow id and execution id. `Observer::notify` must stay
//! synchronous and non-blocking, so publishing itself happens on a
//! background task fed through an unbounded channel -- this preserves
//! per-execution event ordering without making the hot path wait on I/O.
//! Publish failures are transient (spec §7 `TransientPublishError`): logged,
//! never surfaced back to the loop.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use engine_core::{ExecutionId, WorkflowId};
use engine_error::EngineError;
use engine_ports::{
    EventPublisher, NodeExecutedEvent, NodeExecutionStartedEvent, NodeFailedEvent, PublishedEvent,
    WorkflowExecutionCompletedEvent,
};
use tokio::sync::mpsc;

use crate::event::{ExecutionEvent, Observer};

/// Forwards execution events to an [`EventPublisher`], or does nothing if
/// events are disabled for this execution.
pub struct EventBroadcaster {
    sender: Option<mpsc::UnboundedSender<PublishedEvent>>,
    workflow_id: WorkflowId,
    execution_id: ExecutionId,
    nodes_completed: AtomicU32,
    nodes_failed: AtomicU32,
}

impl EventBroadcaster {
    /// Spawn the background forwarding task and return a broadcaster bound
    /// to it. `enabled=false` builds a broadcaster that drops every event
    /// without spawning anything (spec §4.5 "disabled if events turned off").
    #[must_use]
    pub fn spawn(
        publisher: Arc<dyn EventPublisher>,
        workflow_id: WorkflowId,
        execution_id: ExecutionId,
        enabled: bool,
    ) -> Self {
        let sender = enabled.then(|| {
            let (sender, mut receiver) = mpsc::unbounded_channel::<PublishedEvent>();
            tokio::spawn(async move {
                while let Some(event) = receiver.recv().await {
                    if let Err(err) = publisher.publish(event).await {
                        tracing::warn!(error = %err, "transient event publish failure");
                    }
                }
            });
            sender
        });

        Self {
            sender,
            workflow_id,
            execution_id,
            nodes_completed: AtomicU32::new(0),
            nodes_failed: AtomicU32::new(0),
        }
    }

    fn send(&self, event: PublishedEvent) {
        if let Some(sender) = &self.sender {
            // Receiver only drops once the broadcaster itself is dropped;
            // a send error here means the background task panicked.
            let _ = sender.send(event);
        }
    }
}

impl Observer for EventBroadcaster {
    fn notify(&self, event: &ExecutionEvent) -> Result<(), EngineError> {
        match event {
            ExecutionEvent::NodeStarted {
                node_id,
                is_re_execution,
                ..
            } => {
                self.send(PublishedEvent::NodeExecutionStarted(
                    NodeExecutionStartedEvent {
                        execution_id: self.execution_id,
                        workflow_id: self.workflow_id,
                        node_id: *node_id,
                        is_re_execution: *is_re_execution,
                    },
                ));
            }
            ExecutionEvent::NodeCompleted {
                node_id,
                output_items,
                ordinal,
                ..
            } => {
                self.nodes_completed.fetch_add(1, Ordering::Relaxed);
                self.send(PublishedEvent::NodeExecuted(NodeExecutedEvent {
                    execution_id: self.execution_id,
                    workflow_id: self.workflow_id,
                    node_id: *node_id,
                    ordinal: *ordinal,
                    output_items_by_index: output_items.clone(),
                }));
            }
            ExecutionEvent::NodeFailed {
                node_id, error, ..
            } => {
                self.nodes_failed.fetch_add(1, Ordering::Relaxed);
                self.send(PublishedEvent::NodeFailed(NodeFailedEvent {
                    execution_id: self.execution_id,
                    workflow_id: self.workflow_id,
                    node_id: *node_id,
                    message: error.to_string(),
                }));
            }
            ExecutionEvent::WorkflowCompleted { .. } => {
                self.send(PublishedEvent::WorkflowExecutionCompleted(
                    WorkflowExecutionCompletedEvent {
                        execution_id: self.execution_id,
                        workflow_id: self.workflow_id,
                        nodes_completed: self.nodes_completed.load(Ordering::Relaxed),
                        nodes_failed: self.nodes_failed.load(Ordering::Relaxed),
                    },
                ));
            }
        }
        Ok(())
    }
}
