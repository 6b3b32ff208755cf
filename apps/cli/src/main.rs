//! `enginectl` -- a small demo harness for the workflow execution engine.
//!
//! Loads a JSON-encoded [`engine_workflow::Workflow`], runs it through
//! [`engine_api::EngineService`] against stub ports (every integration type
//! is "known" and echoes its input items back), and prints the lifecycle
//! events as they happen. Useful for eyeballing a workflow's shape without
//! wiring up live credentials or a real control plane.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use engine_api::EngineService;
use engine_config::EngineDefaults;
use engine_core::{CredentialId, ExecutionId, NodeId, UserId, WorkflowId};
use engine_error::EngineError;
use engine_events::{ExecutionEvent, Observer};
use engine_ports::{
    CompleteWorkflowExecutionRequest, ControlPlaneClient, ExecutorScheduleManager,
    IntegrationExecutor, IntegrationInput, IntegrationOutput, IntegrationSelector, PortsError,
};
use engine_workflow::Workflow;

#[derive(Parser)]
#[command(name = "enginectl", about = "Run a workflow through the execution engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a workflow definition against a trigger event.
    Run {
        /// Path to a JSON-encoded workflow definition.
        workflow: PathBuf,
        /// Event type the workflow's trigger node must match.
        #[arg(long, default_value = "webhook")]
        event: String,
        /// JSON payload delivered to the trigger. Defaults to `{}`.
        #[arg(long)]
        payload: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    engine_log::init(engine_log::Format::Pretty);

    let cli = Cli::parse();
    match cli.command {
        Command::Run { workflow, event, payload } => run(workflow, event, payload).await,
    }
}

async fn run(workflow_path: PathBuf, event: String, payload: Option<String>) -> Result<()> {
    let raw = std::fs::read_to_string(&workflow_path)
        .with_context(|| format!("reading workflow definition at {}", workflow_path.display()))?;
    let workflow: Workflow = serde_json::from_str(&raw)
        .with_context(|| format!("parsing workflow definition at {}", workflow_path.display()))?;

    let payload: serde_json::Value = match payload {
        Some(raw) => serde_json::from_str(&raw).context("parsing --payload as JSON")?,
        None => serde_json::json!({}),
    };

    let service = EngineService::new(
        Arc::new(EchoSelector),
        Arc::new(EchoExecutor),
        None,
        Arc::new(LoggingControlPlane),
        Arc::new(NoopScheduleManager),
        EngineDefaults::from_env(),
    );

    let result = service
        .execute(
            ExecutionId::v4(),
            Arc::new(workflow),
            &event,
            payload,
            UserId::v4(),
            false,
            vec![Arc::new(PrintObserver)],
        )
        .await
        .map_err(|err| anyhow::anyhow!("execution failed: {err}"))?;

    println!("history entries: {}", result.history_entries.len());
    if let Some(body) = result.response_payload {
        println!("response: {}", String::from_utf8_lossy(&body));
    }
    Ok(())
}

/// Prints every execution event to stdout as it happens.
struct PrintObserver;

impl Observer for PrintObserver {
    fn notify(&self, event: &ExecutionEvent) -> Result<(), EngineError> {
        println!("{event:?}");
        Ok(())
    }
}

/// Treats every integration type as known and connection-testable, but
/// never peekable.
struct EchoSelector;

#[async_trait]
impl IntegrationSelector for EchoSelector {
    async fn select_executor(&self, _integration_type: &str) -> Result<bool, PortsError> {
        Ok(true)
    }
    async fn select_peeker(&self, _integration_type: &str) -> Result<bool, PortsError> {
        Ok(false)
    }
    async fn select_connection_tester(&self, _integration_type: &str) -> Result<bool, PortsError> {
        Ok(true)
    }
}

/// Echoes its input items back on output 0 -- a stand-in for a real
/// integration dispatcher.
struct EchoExecutor;

#[async_trait]
impl IntegrationExecutor for EchoExecutor {
    async fn execute(
        &self,
        _integration_type: &str,
        input: IntegrationInput,
    ) -> Result<IntegrationOutput, PortsError> {
        Ok(IntegrationOutput { items_by_output_index: vec![(0, input.items)] })
    }

    async fn test_connection(
        &self,
        _integration_type: &str,
        _credential_id: CredentialId,
        _payload: serde_json::Value,
    ) -> Result<bool, PortsError> {
        Ok(true)
    }
}

struct LoggingControlPlane;

#[async_trait]
impl ControlPlaneClient for LoggingControlPlane {
    async fn complete_workflow_execution(
        &self,
        request: CompleteWorkflowExecutionRequest,
    ) -> Result<(), PortsError> {
        tracing::info!(
            execution_id = %request.execution_id,
            nodes = request.node_executions.len(),
            "execution completed"
        );
        Ok(())
    }
}

struct NoopScheduleManager;

#[async_trait]
impl ExecutorScheduleManager for NoopScheduleManager {
    async fn get_last_modified_data(
        &self,
        _workflow_id: WorkflowId,
        _node_id: NodeId,
    ) -> Result<Option<serde_json::Value>, PortsError> {
        Ok(None)
    }
    async fn set_last_modified_data(
        &self,
        _workflow_id: WorkflowId,
        _node_id: NodeId,
        _data: serde_json::Value,
    ) -> Result<(), PortsError> {
        Ok(())
    }
}
