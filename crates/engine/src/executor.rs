//! The scheduler and `ExecuteNode` (spec §4.1/§4.2).

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use engine_config::EngineDefaults;
use engine_core::{CredentialId, NodeId};
use engine_error::EngineError;
use engine_events::{EventStream, ExecutionBroker, ExecutionEvent, HistoryRecorder};
use engine_execution::{ExecutionResult, ExecutionTask, PayloadCell, WorkflowExecutionContext};
use engine_ports::{
    CompleteWorkflowExecutionRequest, ControlPlaneClient, HistoryEntrySummary, IntegrationInput,
    IntegrationSelector, NodeExecutionSummary,
};
use engine_telemetry::MetricsRegistry;
use engine_value::{bytes_to_items, items_to_payload};
use engine_workflow::{Workflow, input_handle, output_handle};
use parking_lot::Mutex;

/// Integration type tag reserved for nodes that accept multiple inputs but
/// never join on them (spec §4.3 step 3). An agent node's tool-call inputs
/// each fire independently; waiting for all of them would deadlock a
/// conversational loop that only ever uses one tool per turn.
pub const AGENT_INTEGRATION_TYPE: &str = "agent";

/// Per-execution mutable state, guarded by a single mutex (spec §5).
pub(crate) struct State {
    pub(crate) ready_queue: VecDeque<ExecutionTask>,
    pub(crate) waiting: HashMap<NodeId, engine_execution::WaitingTask>,
    pub(crate) executed: HashSet<NodeId>,
    pub(crate) execution_count: HashMap<NodeId, u32>,
}

/// Everything the executor needs to dispatch one node's action (spec §6
/// "ports the core depends on").
pub struct Executor {
    pub(crate) workflow: Arc<Workflow>,
    pub(crate) nodes_by_event: HashMap<String, Vec<NodeId>>,
    integration_selector: Arc<dyn IntegrationSelector>,
    integration_executor: Arc<dyn engine_ports::IntegrationExecutor>,
    control_plane: Arc<dyn ControlPlaneClient>,
    broker: ExecutionBroker,
    history: Arc<HistoryRecorder>,
    defaults: EngineDefaults,
    node_executions: Mutex<Vec<NodeExecutionSummary>>,
    pub(crate) state: Mutex<State>,
    /// Arrival-order counter for join cells (spec §4.3); not reset across
    /// `execute`/`rerun_node` calls on the same instance since a fresh
    /// executor is built per call.
    sequence: AtomicU64,
    /// Best-effort fan-out of the same events the broker delivers (spec §4.4
    /// "Stream channel"), for UI-facing consumers that tolerate drops.
    stream: EventStream,
    /// In-memory counters/histograms for node lifecycle events.
    metrics: MetricsRegistry,
}

impl Executor {
    /// Build an executor bound to one `workflow`. A fresh instance must be
    /// constructed per `Execute` call (spec §3 "Ownership & lifecycle").
    #[must_use]
    pub fn new(
        workflow: Arc<Workflow>,
        integration_selector: Arc<dyn IntegrationSelector>,
        integration_executor: Arc<dyn engine_ports::IntegrationExecutor>,
        control_plane: Arc<dyn ControlPlaneClient>,
        broker: ExecutionBroker,
        history: Arc<HistoryRecorder>,
        defaults: EngineDefaults,
    ) -> Self {
        let nodes_by_event = workflow.nodes_by_event();
        let stream = EventStream::new(defaults.stream_channel_capacity);
        Self {
            workflow,
            nodes_by_event,
            integration_selector,
            integration_executor,
            control_plane,
            broker,
            history,
            defaults,
            node_executions: Mutex::new(Vec::new()),
            state: Mutex::new(State {
                ready_queue: VecDeque::new(),
                waiting: HashMap::new(),
                executed: HashSet::new(),
                execution_count: HashMap::new(),
            }),
            sequence: AtomicU64::new(0),
            stream,
            metrics: MetricsRegistry::new(),
        }
    }

    /// Assign the next arrival-order number for a join cell (spec §4.3).
    pub(crate) fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// A handle for subscribing to this execution's best-effort event
    /// stream. Distinct from the ordered, must-deliver broker passed to
    /// [`Executor::new`] -- lagging subscribers here silently miss events.
    #[must_use]
    pub fn stream_handle(&self) -> EventStream {
        self.stream.clone()
    }

    /// This execution's metrics registry.
    #[must_use]
    pub fn metrics(&self) -> MetricsRegistry {
        self.metrics.clone()
    }

    /// Run the execution loop to completion (spec §4.1).
    ///
    /// `WorkflowCompleted` and the control-plane completion call always run
    /// before returning, regardless of how the loop terminated.
    pub async fn execute(
        &self,
        ctx: &WorkflowExecutionContext,
        trigger_node_id: NodeId,
    ) -> Result<ExecutionResult, EngineError> {
        let started_at_ms = Utc::now().timestamp_millis().max(0) as u64;

        let _trigger_node = self.workflow.node(trigger_node_id).ok_or_else(|| {
            EngineError::config(
                self.workflow.id,
                format!("trigger node {trigger_node_id} not found"),
            )
        })?;

        {
            let mut payload_by_input_id = HashMap::new();
            payload_by_input_id.insert(
                input_handle(trigger_node_id, 0),
                PayloadCell {
                    source_node_id: trigger_node_id,
                    payload: ctx.input_payload.clone(),
                    sequence: 0,
                },
            );
            self.state.lock().ready_queue.push_front(ExecutionTask {
                node_id: trigger_node_id,
                payload_by_input_id,
            });
        }

        let mut ordinal: u32 = 0;
        let outcome = self.run_loop(ctx, &mut ordinal).await;

        let ended_at_ms = Utc::now().timestamp_millis().max(0) as u64;
        let completed_event = ExecutionEvent::WorkflowCompleted {
            timestamp: Utc::now(),
        };
        self.broker.notify(&completed_event);
        self.stream.publish(completed_event);

        let history_entries = self.history.get_history_entries();
        let node_executions = self.node_executions.lock().clone();
        let request = CompleteWorkflowExecutionRequest {
            execution_id: ctx.execution_id,
            workspace_id: ctx.workspace_id,
            workflow_id: ctx.workflow_id,
            trigger_node_id: Some(trigger_node_id),
            started_at_ms,
            ended_at_ms,
            node_executions,
            history_entries: history_entries
                .iter()
                .map(|e| HistoryEntrySummary {
                    node_id: e.node_id,
                    ordinal: e.ordinal,
                    succeeded: e.succeeded,
                    error: e.error.clone(),
                })
                .collect(),
            is_testing: ctx.is_testing,
        };
        if let Err(err) = self.control_plane.complete_workflow_execution(request).await {
            tracing::warn!(execution_id = %ctx.execution_id, error = %err, "control-plane completion call failed");
        }

        match outcome {
            Some(error) => Err(error),
            None => Ok(ExecutionResult {
                response_payload: ctx.response_payload(),
                response_headers: ctx.response_headers(),
                response_status_code: ctx.response_status_code(),
                history_entries,
            }),
        }
    }

    /// Re-run a single node against caller-supplied items, without further
    /// fan-out to its downstream edges (spec §6 `RerunNode`). Used to replay
    /// one step of a previously recorded execution in isolation.
    pub async fn rerun_node(
        &self,
        ctx: &WorkflowExecutionContext,
        node_id: NodeId,
        input_items: Vec<engine_value::Item>,
    ) -> Result<ExecutionResult, EngineError> {
        let payload = items_to_payload(&input_items).map_err(|err| {
            EngineError::config(self.workflow.id, format!("failed to encode rerun items: {err}"))
        })?;
        let mut payload_by_input_id = HashMap::new();
        payload_by_input_id.insert(
            "rerun".to_string(),
            PayloadCell { source_node_id: node_id, payload, sequence: 0 },
        );
        let task = ExecutionTask { node_id, payload_by_input_id };

        let outcome = self.execute_node(ctx, task, 1, false).await;

        let completed_event = ExecutionEvent::WorkflowCompleted { timestamp: Utc::now() };
        self.broker.notify(&completed_event);
        self.stream.publish(completed_event);
        let history_entries = self.history.get_history_entries();

        outcome.map(|()| ExecutionResult {
            response_payload: ctx.response_payload(),
            response_headers: ctx.response_headers(),
            response_status_code: ctx.response_status_code(),
            history_entries,
        })
    }

    /// Drain the ready queue, flushing waiting tasks when it empties.
    /// Returns `Some(error)` on fatal termination, `None` on normal exit.
    async fn run_loop(&self, ctx: &WorkflowExecutionContext, ordinal: &mut u32) -> Option<EngineError> {
        loop {
            if ctx.is_cancelled() {
                return Some(EngineError::Cancelled);
            }

            let task = self.state.lock().ready_queue.pop_front();
            let Some(task) = task else {
                return None;
            };
            let node_id = task.node_id;
            *ordinal += 1;

            if let Err(error) = self.execute_node(ctx, task, *ordinal, true).await {
                return Some(error);
            }

            let limit = {
                let node = self.workflow.node(node_id);
                node.map(|n| self.workflow.effective_execution_limit(n, self.defaults.default_execution_limit))
            };
            if let Some(limit) = limit {
                let count = self.state.lock().execution_count.get(&node_id).copied().unwrap_or(0);
                if count >= limit {
                    return Some(EngineError::limit_exceeded(node_id, limit));
                }
            }

            let mut state = self.state.lock();
            if state.ready_queue.is_empty() && !state.waiting.is_empty() {
                let waiting: Vec<_> = state.waiting.drain().map(|(_, w)| w).collect();
                for w in waiting {
                    state.ready_queue.push_front(ExecutionTask {
                        node_id: w.node_id,
                        payload_by_input_id: w.flatten(),
                    });
                }
            }
        }
    }

    /// Run one node's effect, emit its lifecycle events, and (if
    /// `propagate`) enqueue downstream tasks (spec §4.2).
    async fn execute_node(
        &self,
        ctx: &WorkflowExecutionContext,
        task: ExecutionTask,
        ordinal: u32,
        propagate: bool,
    ) -> Result<(), EngineError> {
        let node_id = task.node_id;
        let node = self
            .workflow
            .node(node_id)
            .ok_or_else(|| EngineError::config(self.workflow.id, format!("node {node_id} not found")))?
            .clone();

        let is_re_execution = {
            let mut state = self.state.lock();
            let re = state.executed.contains(&node_id);
            *state.execution_count.entry(node_id).or_insert(0) += 1;
            re
        };

        let started_at = Utc::now();
        let started_event = ExecutionEvent::NodeStarted {
            node_id,
            timestamp: started_at,
            is_re_execution,
        };
        self.broker.notify(&started_event);
        self.stream.publish(started_event);
        self.metrics.counter("nodes_started_total").inc();

        let source_payloads: HashMap<String, Vec<u8>> = task
            .payload_by_input_id
            .iter()
            .map(|(id, cell)| (id.clone(), cell.payload.clone()))
            .collect();

        let mut input_items = Vec::new();
        for cell in task.payload_by_input_id.values() {
            input_items.extend(bytes_to_items(&cell.payload).map_err(|err| {
                EngineError::config(self.workflow.id, format!("undecodable input payload: {err}"))
            })?);
        }

        // An in-flight integration call races the cancellation token rather
        // than running to completion regardless (spec §5 "suspension
        // points"): a cancelled node leaves `NodeStarted` unmatched by any
        // `NodeCompleted`/`NodeFailed`, which the main loop's fatal-error
        // path already treats as a valid termination.
        let dispatch_future = self.dispatch(ctx, &node, &task, &input_items);
        tokio::pin!(dispatch_future);
        let dispatch = tokio::select! {
            res = &mut dispatch_future => res,
            () = ctx.cancellation.cancelled() => return Err(EngineError::Cancelled),
        };

        let output_raw: Vec<(u32, Vec<u8>)> = match dispatch {
            Ok(raw) => raw,
            Err(error) if node.node_settings.return_error_as_item && error.is_integration_error() => {
                let mut error_item = engine_value::Item::new();
                error_item.insert(
                    "error_message".to_string(),
                    serde_json::Value::String(error.to_string()),
                );
                let payload = items_to_payload(&[error_item]).map_err(|err| {
                    EngineError::config(self.workflow.id, format!("failed to encode error item: {err}"))
                })?;
                vec![(0, payload)]
            }
            Err(error) => {
                let failed_event = ExecutionEvent::NodeFailed {
                    node_id,
                    input_items,
                    error: error.clone(),
                    timestamp: Utc::now(),
                    is_re_execution,
                };
                self.broker.notify(&failed_event);
                self.stream.publish(failed_event);
                self.metrics.counter("nodes_failed_total").inc();
                return Err(error);
            }
        };

        self.state.lock().executed.insert(node_id);

        if propagate {
            for (index, payload) in &output_raw {
                let items = bytes_to_items(payload).unwrap_or_default();
                if items.is_empty() {
                    continue;
                }
                let handle = output_handle(node_id, *index);
                let downstream = self.nodes_by_event.get(&handle).cloned().unwrap_or_default();
                for downstream_id in downstream {
                    self.add_task_for_downstream_node(downstream_id, &handle, node_id, payload.clone())?;
                }
            }
        }

        let ended_at = Utc::now();
        let output_items: Vec<(u32, Vec<engine_value::Item>)> = output_raw
            .iter()
            .map(|(index, payload)| (*index, bytes_to_items(payload).unwrap_or_default()))
            .collect();
        let integration_output: HashMap<u32, Vec<u8>> =
            output_raw.iter().cloned().collect();

        let (integration_type, action_type) = match &node.kind {
            engine_workflow::NodeKind::Trigger { event_type } => {
                (node.integration_type.clone(), event_type.clone())
            }
            engine_workflow::NodeKind::Action { action_type } => {
                (node.integration_type.clone(), action_type.clone())
            }
        };

        let started_at_ms = started_at.timestamp_millis().max(0) as u64;
        let ended_at_ms = ended_at.timestamp_millis().max(0) as u64;
        self.node_executions.lock().push(NodeExecutionSummary {
            node_id,
            ordinal,
            input_item_count: input_items.len(),
            output_item_count: output_items.iter().map(|(_, items)| items.len()).sum(),
            integration_type: integration_type.clone(),
            action_type: action_type.clone(),
            started_at_ms,
            ended_at_ms,
        });

        self.metrics.counter("nodes_completed_total").inc();
        self.metrics
            .histogram("node_duration_ms")
            .observe((ended_at - started_at).num_milliseconds().max(0) as f64);

        let completed_event = ExecutionEvent::NodeCompleted {
            node_id,
            input_items,
            output_items,
            source_payloads,
            integration_output,
            integration_type,
            action_type,
            started_at,
            ended_at,
            ordinal,
            is_re_execution,
        };
        self.broker.notify(&completed_event);
        self.stream.publish(completed_event);

        Ok(())
    }

    async fn dispatch(
        &self,
        ctx: &WorkflowExecutionContext,
        node: &engine_workflow::Node,
        task: &ExecutionTask,
        input_items: &[engine_value::Item],
    ) -> Result<Vec<(u32, Vec<u8>)>, EngineError> {
        match &node.kind {
            engine_workflow::NodeKind::Trigger { .. } => {
                let payload = task
                    .payload_by_input_id
                    .values()
                    .next()
                    .map(|cell| cell.payload.clone())
                    .unwrap_or_else(|| ctx.input_payload.clone());
                Ok(vec![(0, payload)])
            }
            engine_workflow::NodeKind::Action { action_type } => {
                if node.is_agent_sub_item() {
                    return Ok(vec![]);
                }

                let known = self
                    .integration_selector
                    .select_executor(&node.integration_type)
                    .await
                    .map_err(|err| EngineError::config(self.workflow.id, err.to_string()))?;
                if !known {
                    return Err(EngineError::config(
                        self.workflow.id,
                        format!("unknown integration type {}", node.integration_type),
                    ));
                }

                let credential_id = match node.settings.get("credential_id") {
                    None | Some(serde_json::Value::Null) => None,
                    Some(value) => {
                        let raw = value.as_str().ok_or_else(|| {
                            EngineError::config(
                                self.workflow.id,
                                format!("node {} credential_id must be a string", node.id),
                            )
                        })?;
                        let parsed: CredentialId = raw.parse().map_err(|_| {
                            EngineError::config(
                                self.workflow.id,
                                format!("node {} has a malformed credential_id", node.id),
                            )
                        })?;
                        Some(parsed)
                    }
                };

                let input = IntegrationInput {
                    action_type: action_type.clone(),
                    settings: node.settings.clone(),
                    items: input_items.to_vec(),
                    credential_id,
                };

                let output = self
                    .integration_executor
                    .execute(&node.integration_type, input)
                    .await
                    .map_err(|err| EngineError::integration(node.id, err.to_string()))?;

                output
                    .items_by_output_index
                    .into_iter()
                    .map(|(index, items)| {
                        items_to_payload(&items)
                            .map(|payload| (index, payload))
                            .map_err(|err| EngineError::integration(node.id, err.to_string()))
                    })
                    .collect()
            }
        }
    }
}

trait IsIntegrationError {
    fn is_integration_error(&self) -> bool;
}

impl IsIntegrationError for EngineError {
    fn is_integration_error(&self) -> bool {
        matches!(self, EngineError::IntegrationError { .. })
    }
}
