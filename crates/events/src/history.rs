//! History recorder standard subscriber (spec §4.5).

use chrono::{DateTime, Utc};
use engine_core::NodeId;
use engine_error::EngineError;
use engine_value::Item;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::event::{ExecutionEvent, Observer};

/// One recorded node outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub node_id: NodeId,
    pub ordinal: u32,
    pub succeeded: bool,
    pub timestamp: DateTime<Utc>,
    pub input_items: Vec<Item>,
    pub output_items: Vec<(u32, Vec<Item>)>,
    /// Set only on a failed entry.
    pub error: Option<String>,
}

/// Accumulates an ordered history of node completions and failures.
///
/// Only `NodeCompleted` and `NodeFailed` produce entries; `NodeStarted` and
/// `WorkflowCompleted` are ignored (spec §4.5, invariant 5 in spec §8).
#[derive(Default)]
pub struct HistoryRecorder {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A point-in-time snapshot of everything recorded so far.
    #[must_use]
    pub fn get_history_entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().clone()
    }
}

impl Observer for HistoryRecorder {
    fn notify(&self, event: &ExecutionEvent) -> Result<(), EngineError> {
        match event {
            ExecutionEvent::NodeCompleted {
                node_id,
                input_items,
                output_items,
                ordinal,
                ended_at,
                ..
            } => {
                self.entries.lock().push(HistoryEntry {
                    node_id: *node_id,
                    ordinal: *ordinal,
                    succeeded: true,
                    timestamp: *ended_at,
                    input_items: input_items.clone(),
                    output_items: output_items.clone(),
                    error: None,
                });
            }
            ExecutionEvent::NodeFailed {
                node_id,
                input_items,
                error,
                timestamp,
                ..
            } => {
                self.entries.lock().push(HistoryEntry {
                    node_id: *node_id,
                    ordinal: 0,
                    succeeded: false,
                    timestamp: *timestamp,
                    input_items: input_items.clone(),
                    output_items: vec![],
                    error: Some(error.to_string()),
                });
            }
            ExecutionEvent::NodeStarted { .. } | ExecutionEvent::WorkflowCompleted { .. } => {}
        }
        Ok(())
    }
}
