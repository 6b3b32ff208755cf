//! The in-process execution event contract (spec §4.4).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use engine_core::NodeId;
use engine_error::EngineError;
use engine_value::Item;
use serde::{Deserialize, Serialize};

/// One event in a node's lifecycle, or the terminal workflow event.
///
/// This is the shape [`Observer::notify`] delivers. It deliberately carries
/// no `workflow_id`/`execution_id` -- those are ambient to one broker
/// instance, not to each event; [`crate::EventBroadcaster`] stamps them on
/// when forwarding to the external publisher port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutionEvent {
    /// A node has begun executing.
    NodeStarted {
        node_id: NodeId,
        timestamp: DateTime<Utc>,
        is_re_execution: bool,
    },
    /// A node finished successfully.
    NodeCompleted {
        node_id: NodeId,
        input_items: Vec<Item>,
        output_items: Vec<(u32, Vec<Item>)>,
        /// Raw input payload bytes, keyed by input id. Used by the usage
        /// collector to count items/bytes without re-deriving `input_items`.
        source_payloads: HashMap<String, Vec<u8>>,
        /// Raw output payload bytes, keyed by logical output index.
        integration_output: HashMap<u32, Vec<u8>>,
        integration_type: String,
        action_type: String,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        /// Strictly increasing, contiguous, 1-based across the execution.
        ordinal: u32,
        is_re_execution: bool,
    },
    /// A node failed and the failure was not absorbed as an error item.
    NodeFailed {
        node_id: NodeId,
        input_items: Vec<Item>,
        error: EngineError,
        timestamp: DateTime<Utc>,
        is_re_execution: bool,
    },
    /// The execution has finished, successfully or not.
    WorkflowCompleted { timestamp: DateTime<Utc> },
}

impl ExecutionEvent {
    /// The node this event concerns, if any (`WorkflowCompleted` has none).
    #[must_use]
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::NodeStarted { node_id, .. }
            | Self::NodeCompleted { node_id, .. }
            | Self::NodeFailed { node_id, .. } => Some(*node_id),
            Self::WorkflowCompleted { .. } => None,
        }
    }
}

/// A synchronous subscriber to the execution event stream.
///
/// Subscriber failures are non-fatal: a broker logs them and keeps
/// delivering to the remaining subscribers (spec §4.4).
pub trait Observer: Send + Sync {
    fn notify(&self, event: &ExecutionEvent) -> Result<(), EngineError>;
}

/// Delivers events synchronously, in registration order, to a fixed set of
/// subscribers.
///
/// The subscriber list is immutable after construction -- spec §5's
/// concurrency model has no "subscribe mid-execution" case, so there is no
/// `subscribe()` method here, only the constructor.
#[derive(Clone)]
pub struct ExecutionBroker {
    subscribers: Arc<Vec<Arc<dyn Observer>>>,
}

impl ExecutionBroker {
    #[must_use]
    pub fn new(subscribers: Vec<Arc<dyn Observer>>) -> Self {
        Self {
            subscribers: Arc::new(subscribers),
        }
    }

    /// Deliver `event` to every subscriber in order. A subscriber error is
    /// logged via `tracing::warn!` and does not stop delivery to the rest.
    pub fn notify(&self, event: &ExecutionEvent) {
        for (index, subscriber) in self.subscribers.iter().enumerate() {
            if let Err(err) = subscriber.notify(event) {
                tracing::warn!(subscriber_index = index, error = %err, "subscriber failed");
            }
        }
    }
}
