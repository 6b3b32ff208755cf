//! The join coordinator: `AddTaskForDownstreamNode` (spec §4.3).

use std::collections::HashMap;

use engine_core::NodeId;
use engine_error::EngineError;
use engine_execution::{ExecutionTask, PayloadCell, WaitingTask};

use crate::executor::{AGENT_INTEGRATION_TYPE, Executor};

impl Executor {
    /// Enqueue `downstream_id` immediately, or buffer it in the waiting set
    /// until its join condition is met (spec §4.3 policy).
    pub(crate) fn add_task_for_downstream_node(
        &self,
        downstream_id: NodeId,
        output_handle: &str,
        source_node_id: NodeId,
        payload: Vec<u8>,
    ) -> Result<(), EngineError> {
        let node = self.workflow.node(downstream_id).ok_or_else(|| {
            EngineError::config(self.workflow.id, format!("downstream node {downstream_id} not found"))
        })?;

        let matching_input_id = node
            .inputs
            .iter()
            .find(|input| input.subscribed_events.iter().any(|h| h == output_handle))
            .map(|input| input.input_id.clone())
            .ok_or_else(|| {
                EngineError::config(
                    self.workflow.id,
                    format!("node {downstream_id} has no input subscribed to {output_handle}"),
                )
            })?;

        let cell = PayloadCell {
            source_node_id,
            payload,
            sequence: self.next_sequence(),
        };

        let mut state = self.state.lock();

        if let Some(waiting) = state.waiting.get_mut(&downstream_id) {
            waiting.record(matching_input_id, output_handle, cell);
            let required: Vec<String> = node.inputs.iter().map(|i| i.input_id.clone()).collect();
            if waiting.is_ready(&required) {
                let flattened = waiting.flatten();
                state.waiting.remove(&downstream_id);
                state.ready_queue.push_front(ExecutionTask {
                    node_id: downstream_id,
                    payload_by_input_id: flattened,
                });
            }
            return Ok(());
        }

        let is_agent_variant = node.integration_type == AGENT_INTEGRATION_TYPE;
        let subscribed_handle_count: usize =
            node.inputs.iter().map(|input| input.subscribed_events.len()).sum();
        if subscribed_handle_count > 1 && !is_agent_variant {
            let mut waiting = WaitingTask::new(downstream_id);
            waiting.record(matching_input_id, output_handle, cell);
            state.waiting.insert(downstream_id, waiting);
        } else {
            let mut payload_by_input_id: HashMap<String, PayloadCell> = HashMap::new();
            payload_by_input_id.insert(matching_input_id, cell);
            state.ready_queue.push_front(ExecutionTask {
                node_id: downstream_id,
                payload_by_input_id,
            });
        }
        Ok(())
    }
}
