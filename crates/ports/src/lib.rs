#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Engine Ports
//!
//! Backend interface traits (ports) for the workflow execution engine.
//!
//! This crate defines the **port** traits the executor depends on and a
//! concrete backend (HTTP, gRPC, in-memory test double, ...) implements.
//! It follows the Ports & Drivers (hexagonal) architecture pattern:
//!
//! - [`IntegrationSelector`], [`IntegrationExecutor`], [`IntegrationPeeker`] -- integration dispatch
//! - [`CredentialGetter`] -- decrypted credential retrieval
//! - [`EventPublisher`], [`StreamEventPublisher`] -- structured event delivery
//! - [`ControlPlaneClient`] -- end-of-execution reporting
//! - [`ExecutorStorageManager`] -- inter-node file storage
//! - [`ExecutorScheduleManager`] -- polling-trigger watermarks
//! - [`ExecutorTaskPublisher`] -- deferred workflow task dispatch
//!
//! All traits are `async_trait` and object-safe, suitable for use as
//! `Box<dyn Trait>` or `Arc<dyn Trait>` behind dependency injection.

pub mod control_plane;
pub mod credential;
pub mod error;
pub mod events;
pub mod integration;
pub mod schedule;
pub mod storage;
pub mod task;

pub use control_plane::{
    CompleteWorkflowExecutionRequest, ControlPlaneClient, HistoryEntrySummary,
    NodeExecutionSummary,
};
pub use credential::CredentialGetter;
pub use error::PortsError;
pub use events::{
    EventPublisher, NodeExecutedEvent, NodeExecutionStartedEvent, NodeFailedEvent, PublishedEvent,
    StreamEventPublisher, WorkflowExecutionCompletedEvent,
};
pub use integration::{
    IntegrationExecutor, IntegrationInput, IntegrationOutput, IntegrationPeeker,
    IntegrationSelector, PeekResult,
};
pub use schedule::ExecutorScheduleManager;
pub use storage::{ExecutorStorageManager, FileItem, FileReader};
pub use task::{ExecuteWorkflowTask, ExecutorTaskPublisher};
