//! Ready and waiting task shapes (spec §3).

use std::collections::HashMap;

use engine_core::NodeId;
use engine_value::{bytes_to_items, items_to_payload};

/// One upstream payload arriving at a single input cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadCell {
    pub source_node_id: NodeId,
    pub payload: Vec<u8>,
    /// Monotonically increasing arrival order, assigned by the executor
    /// when the cell is recorded. Cells that never pass through a join
    /// (the trigger's own kickoff payload, a `RerunNode` replay) carry `0`
    /// since they are never compared against a sibling cell.
    pub sequence: u64,
}

/// A ready-to-run unit: one payload per input id, already resolved.
///
/// A node may be enqueued multiple times during one execution -- fan-in
/// bursts, re-entry via different branches -- subject to its effective cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionTask {
    pub node_id: NodeId,
    pub payload_by_input_id: HashMap<String, PayloadCell>,
}

/// A node that has received at least one but not all of its required
/// inputs. Exactly one exists per pending-join node at any time; the
/// executor guards its mutation with the same mutex as the ready queue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WaitingTask {
    pub node_id: NodeId,
    /// `input_id -> output_handle -> cell`. Keeping every handle that fired
    /// (not just the latest) lets readiness evaluation and last-wins
    /// flattening happen independently.
    pub received_payloads: HashMap<String, HashMap<String, PayloadCell>>,
}

impl WaitingTask {
    #[must_use]
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            received_payloads: HashMap::new(),
        }
    }

    /// Record a payload on `input_id`'s `output_handle` cell, replacing any
    /// previous payload recorded on that exact cell (spec §4.3 step 2a).
    pub fn record(
        &mut self,
        input_id: impl Into<String>,
        output_handle: impl Into<String>,
        cell: PayloadCell,
    ) {
        self.received_payloads
            .entry(input_id.into())
            .or_default()
            .insert(output_handle.into(), cell);
    }

    /// Flatten every input's recorded cells into one payload per input id
    /// (spec §4.3 step 2b / §4.1 step 2e flush-waiting fallback).
    ///
    /// An input fed by a single subscribed handle yields that handle's
    /// payload unchanged. An input fed by more than one subscribed handle
    /// (e.g. two trigger outputs both feeding the same join input) merges
    /// every recorded cell's items, in the order the cells arrived, into
    /// one payload -- arrival order comes from each cell's `sequence`, not
    /// handle-name order, since handle names sort lexicographically rather
    /// than chronologically.
    #[must_use]
    pub fn flatten(&self) -> HashMap<String, PayloadCell> {
        self.received_payloads
            .iter()
            .filter_map(|(input_id, cells)| merge_cells(cells).map(|cell| (input_id.clone(), cell)))
            .collect()
    }

    /// Ready when every key in `required_input_ids` has at least one
    /// recorded cell (spec §4.3 "any-input-any-subscription satisfied").
    #[must_use]
    pub fn is_ready(&self, required_input_ids: &[String]) -> bool {
        required_input_ids
            .iter()
            .all(|id| self.received_payloads.get(id).is_some_and(|m| !m.is_empty()))
    }
}

/// Merge one input's recorded cells into a single cell, in arrival order.
/// A single cell is returned unchanged; two or more are decoded into items,
/// concatenated, and re-encoded into one payload.
fn merge_cells(cells: &HashMap<String, PayloadCell>) -> Option<PayloadCell> {
    let mut ordered: Vec<&PayloadCell> = cells.values().collect();
    ordered.sort_by_key(|cell| cell.sequence);

    match ordered.as_slice() {
        [] => None,
        [only] => Some((*only).clone()),
        multiple => {
            let last = multiple.last().expect("multiple has at least one element");
            let items: Vec<_> = multiple
                .iter()
                .flat_map(|cell| bytes_to_items(&cell.payload).unwrap_or_default())
                .collect();
            let payload = items_to_payload(&items).unwrap_or_default();
            Some(PayloadCell {
                source_node_id: last.source_node_id,
                payload,
                sequence: last.sequence,
            })
        }
    }
}
