//! Usage collector standard subscriber (spec §4.5).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use engine_core::NodeId;
use engine_error::EngineError;
use engine_value::bytes_to_items;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{ExecutionEvent, Observer};

/// Item count and total byte size for one payload slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayloadUsage {
    pub item_count: usize,
    pub byte_count: usize,
}

/// One node's input/output usage, keyed the way the event carries them:
/// inputs by input id, outputs by logical output index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecutionRecord {
    pub record_id: Uuid,
    pub node_id: NodeId,
    pub ordinal: u32,
    pub input_usage: HashMap<String, PayloadUsage>,
    pub output_usage: HashMap<u32, PayloadUsage>,
    pub integration_type: String,
    pub action_type: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Accumulates one [`NodeExecutionRecord`] per `NodeCompleted` event.
///
/// A payload slot that fails to parse into items is logged and skipped --
/// it never fails the whole event (spec §4.5).
#[derive(Default)]
pub struct UsageCollector {
    records: Mutex<Vec<NodeExecutionRecord>>,
}

impl UsageCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get_records(&self) -> Vec<NodeExecutionRecord> {
        self.records.lock().clone()
    }
}

fn usage_of(payload: &[u8]) -> Option<PayloadUsage> {
    match bytes_to_items(payload) {
        Ok(items) => Some(PayloadUsage {
            item_count: items.len(),
            byte_count: payload.len(),
        }),
        Err(err) => {
            tracing::warn!(error = %err, "usage collector: skipping unparseable payload");
            None
        }
    }
}

impl Observer for UsageCollector {
    fn notify(&self, event: &ExecutionEvent) -> Result<(), EngineError> {
        let ExecutionEvent::NodeCompleted {
            node_id,
            source_payloads,
            integration_output,
            integration_type,
            action_type,
            started_at,
            ended_at,
            ordinal,
            ..
        } = event
        else {
            return Ok(());
        };

        let input_usage = source_payloads
            .iter()
            .filter_map(|(input_id, bytes)| usage_of(bytes).map(|u| (input_id.clone(), u)))
            .collect();
        let output_usage = integration_output
            .iter()
            .filter_map(|(index, bytes)| usage_of(bytes).map(|u| (*index, u)))
            .collect();

        self.records.lock().push(NodeExecutionRecord {
            record_id: Uuid::new_v4(),
            node_id: *node_id,
            ordinal: *ordinal,
            input_usage,
            output_usage,
            integration_type: integration_type.clone(),
            action_type: action_type.clone(),
            started_at: *started_at,
            ended_at: *ended_at,
        });
        Ok(())
    }
}
