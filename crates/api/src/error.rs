//! The facade's own error type (spec §6/§7).
//!
//! [`engine_error::EngineError`] is scoped to one in-flight execution --
//! every variant carries a workflow or node id. The facade's other four
//! operations (`TestConnection`, `PeekData`, `HandlePollingEvent`,
//! cancellation) have no such context, so failures there are wrapped here
//! instead of stretching `EngineError`'s taxonomy to fit.

use engine_core::ExecutionId;
use engine_ports::PortsError;

/// Errors raised by the [`crate::EngineService`] facade.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Execution failed; see the wrapped [`engine_error::EngineError`].
    #[error(transparent)]
    Execution(#[from] engine_error::EngineError),

    /// A port call (integration selection, peek, schedule watermark, ...)
    /// failed.
    #[error(transparent)]
    Port(#[from] PortsError),

    /// The requested workflow has no trigger whose event type matches.
    #[error("no trigger node in workflow {workflow_id} matches event {event_type}")]
    UnknownTrigger { workflow_id: engine_core::WorkflowId, event_type: String },

    /// `PeekData` was called but no [`engine_ports::IntegrationPeeker`] was
    /// configured for this service instance.
    #[error("integration type {integration_type} does not support PeekData")]
    PeekNotSupported { integration_type: String },

    /// `CancelExecution` was called with an id not currently tracked.
    #[error("no execution {0} is currently tracked")]
    UnknownExecution(ExecutionId),

    /// The caller-supplied payload could not be decoded as JSON.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
