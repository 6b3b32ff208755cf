//! The engine's error taxonomy (spec §7).
//!
//! Six variants, each with a narrow, specific meaning. `is_retryable()`
//! distinguishes the one variant a caller might reasonably retry
//! (`TransientPublishError`) from the rest, which are either fatal to the
//! execution or already absorbed by the time they reach a caller.

use engine_core::{NodeId, WorkflowId};
use thiserror::Error;

/// Errors raised anywhere in the execution engine.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// The workflow definition itself is malformed: an unknown node id, an
    /// edge whose output handle no input subscribes to, or a credential id
    /// of the wrong shape. Raised during resolution; terminates the
    /// execution before any further node runs.
    #[error("workflow {workflow_id} is malformed: {message}")]
    ConfigError { workflow_id: WorkflowId, message: String },

    /// Raised by an action handler (or the integration it dispatches to).
    /// Either surfaces to the caller and kills the loop, or is absorbed
    /// into a synthetic error item, depending on the node's
    /// `return_error_as_item` setting.
    #[error("node {node_id} integration failed: {message}")]
    IntegrationError { node_id: NodeId, message: String },

    /// A node ran more than its effective execution-count cap. Fatal for
    /// the whole execution.
    #[error("node {node_id} exceeded its execution limit of {limit}")]
    LimitExceeded { node_id: NodeId, limit: u32 },

    /// The ambient cancellation token was cancelled. The loop exits and the
    /// completion path (WorkflowCompleted, control-plane notification)
    /// still runs, best-effort.
    #[error("execution was cancelled")]
    Cancelled,

    /// Raised by an observer subscriber. Logged and suppressed; never
    /// propagates out of `Notify`.
    #[error("subscriber failed: {message}")]
    SubscriberError { message: String },

    /// The external event publisher failed to deliver one or more events.
    /// Logged, not fatal — the execution still completes and returns its
    /// result.
    #[error("event publish failed: {message}")]
    TransientPublishError { message: String },
}

impl EngineError {
    /// Whether a caller might reasonably retry the operation that produced
    /// this error. Only publish failures are retryable; everything else is
    /// either a terminal condition for the execution or already absorbed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::TransientPublishError { .. })
    }

    /// Whether this error should abort the execution loop outright, as
    /// opposed to being logged and absorbed in place.
    #[must_use]
    pub fn is_fatal_to_execution(&self) -> bool {
        matches!(
            self,
            EngineError::ConfigError { .. }
                | EngineError::IntegrationError { .. }
                | EngineError::LimitExceeded { .. }
                | EngineError::Cancelled
        )
    }

    pub fn config(workflow_id: WorkflowId, message: impl Into<String>) -> Self {
        EngineError::ConfigError { workflow_id, message: message.into() }
    }

    pub fn integration(node_id: NodeId, message: impl Into<String>) -> Self {
        EngineError::IntegrationError { node_id, message: message.into() }
    }

    pub fn limit_exceeded(node_id: NodeId, limit: u32) -> Self {
        EngineError::LimitExceeded { node_id, limit }
    }

    pub fn subscriber(message: impl Into<String>) -> Self {
        EngineError::SubscriberError { message: message.into() }
    }

    pub fn transient_publish(message: impl Into<String>) -> Self {
        EngineError::TransientPublishError { message: message.into() }
    }
}

/// Result type used throughout the engine.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
