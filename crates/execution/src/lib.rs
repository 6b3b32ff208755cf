#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Engine Execution
//!
//! Per-execution task and context types the executor (`engine` crate)
//! owns for the lifetime of one `Execute` call (spec §3, §4.1).

mod context;
mod task;

pub use context::{ExecutionResult, WorkflowExecutionContext};
pub use task::{ExecutionTask, PayloadCell, WaitingTask};
