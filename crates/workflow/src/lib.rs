//! Workflow data model (spec §3).
//!
//! A [`Workflow`] is immutable for the duration of one execution: a
//! workspace-scoped collection of [`Node`]s linked only by output/input
//! handle strings. The engine has no other edge representation.

use std::collections::HashMap;

use engine_core::{NodeId, WorkflowId, WorkspaceId};
use serde::{Deserialize, Serialize};

/// Derive the canonical output handle for a node's logical output index.
#[must_use]
pub fn output_handle(node_id: NodeId, index: u32) -> String {
    format!("output-{node_id}-{index}")
}

/// Derive the canonical input handle for a node's logical input index.
#[must_use]
pub fn input_handle(node_id: NodeId, index: u32) -> String {
    format!("input-{node_id}-{index}")
}

/// Per-node behavior overrides (spec §3 settings block).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NodeSettings {
    /// If true, an integration error is synthesized into a single error
    /// item on output 0 instead of aborting the execution (spec §4.2 step 5).
    pub return_error_as_item: bool,
    /// If true, `execution_limit` overrides the workflow/engine defaults
    /// (spec §7 effective-limit resolution).
    pub overwrite_execution_limit: bool,
    /// This node's own execution cap, used only when
    /// `overwrite_execution_limit` is set and this value is positive.
    pub execution_limit: u32,
}

/// A named sink on a node, listening to a set of output handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    /// Stable identifier, unique within the owning node.
    pub input_id: String,
    /// Fully-qualified output handles this input subscribes to.
    pub subscribed_events: Vec<String>,
}

/// The two node kinds: a single entry point, and arbitrary downstream
/// effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry point. At most one fires per execution.
    Trigger {
        /// Event-type string identifying which trigger flavor this is.
        event_type: String,
    },
    /// An arbitrary effect, dispatched through the integration action
    /// manager (spec §4.7).
    Action {
        /// Action-type string, resolved against the node's integration.
        action_type: String,
    },
}

/// A vertex in the workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Integration type tag, resolved through the `IntegrationSelector` port.
    pub integration_type: String,
    /// Opaque to the engine; parsed by the integration itself.
    pub settings: serde_json::Map<String, serde_json::Value>,
    pub inputs: Vec<Input>,
    /// Logical output indices this node may emit on.
    pub output_indices: Vec<u32>,
    pub node_settings: NodeSettings,
    /// Usage-context tag. Non-empty, non-"workflow" values mark agent
    /// sub-items that are not executed directly (spec §4.2 step 4).
    pub usage_context: String,
}

impl Node {
    #[must_use]
    pub fn output_handle(&self, index: u32) -> String {
        output_handle(self.id, index)
    }

    #[must_use]
    pub fn is_trigger(&self) -> bool {
        matches!(self.kind, NodeKind::Trigger { .. })
    }

    /// Whether this node should be treated as a no-op by `ExecuteNode`
    /// (spec §4.2 step 4: a non-empty, non-"workflow" usage context marks
    /// agent sub-items that are not executed here).
    #[must_use]
    pub fn is_agent_sub_item(&self) -> bool {
        !self.usage_context.is_empty() && self.usage_context != "workflow"
    }
}

/// Workflow-level defaults and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WorkflowSettings {
    /// Default per-node execution cap when a node does not override it.
    /// `0` means "unset" — the engine default applies.
    pub node_execution_limit: u32,
}

/// An immutable, workspace-scoped workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub workspace_id: WorkspaceId,
    pub settings: WorkflowSettings,
    pub nodes: Vec<Node>,
}

impl Workflow {
    /// Build the `output handle -> downstream node ids` index the executor
    /// precomputes once at construction (spec §4.1 `nodes_by_event`).
    #[must_use]
    pub fn nodes_by_event(&self) -> HashMap<String, Vec<NodeId>> {
        let mut index: HashMap<String, Vec<NodeId>> = HashMap::new();
        for node in &self.nodes {
            for input in &node.inputs {
                for handle in &input.subscribed_events {
                    index.entry(handle.clone()).or_default().push(node.id);
                }
            }
        }
        index
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    #[must_use]
    pub fn trigger_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.is_trigger())
    }

    /// Resolve the effective per-node execution cap, per spec §7: node
    /// override wins first, then the workflow default, then the supplied
    /// engine default.
    #[must_use]
    pub fn effective_execution_limit(&self, node: &Node, engine_default: u32) -> u32 {
        if node.node_settings.overwrite_execution_limit && node.node_settings.execution_limit > 0
        {
            return node.node_settings.execution_limit;
        }
        if self.settings.node_execution_limit > 0 {
            return self.settings.node_execution_limit;
        }
        engine_default
    }
}
