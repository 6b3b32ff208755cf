//! Core identifier types shared across the workflow execution engine.
//!
//! This crate provides the strongly-typed IDs used to name executions,
//! workflows, nodes, users, credentials and stored resources. It intentionally
//! carries no behavior beyond identity — everything else (errors, events,
//! scheduling) lives in its own crate.
//!
//! ## Usage
//!
//! ```rust
//! use engine_core::{ExecutionId, WorkflowId, NodeId};
//!
//! let execution_id = ExecutionId::v4();
//! let workflow_id = WorkflowId::v4();
//! let node_id = NodeId::v4();
//! ```

pub mod id;

pub use id::*;

/// Common prelude for downstream crates.
pub mod prelude {
    pub use super::{
        CredentialId, ExecutionId, NodeId, ResourceId, UserId, UuidParseError, WorkflowId,
        WorkspaceId,
    };
}
