#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Engine API
//!
//! The service-surface facade (spec §6) a transport layer (HTTP, gRPC, a
//! CLI, ...) calls into. [`EngineService`] owns nothing about the wire: it
//! resolves a trigger node, builds one [`engine::Executor`] per call, and
//! tracks in-flight executions so a caller can cancel one by id.

mod error;
mod registry;
mod service;

pub use error::ApiError;
pub use registry::ExecutionRegistry;
pub use service::{EngineService, PollResult};
