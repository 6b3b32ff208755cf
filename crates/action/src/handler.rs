//! The four action registration flavors (spec §4.7).

use async_trait::async_trait;
use engine_core::{CredentialId, NodeId, WorkspaceId};
use engine_error::EngineError;
use engine_value::Item;

/// Ambient, per-invocation context an action handler is called with.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub node_id: NodeId,
    pub workspace_id: WorkspaceId,
    pub credential_id: Option<CredentialId>,
}

/// Handler takes one item, returns one item. The manager iterates all
/// input items and collects results onto output index 0.
#[async_trait]
pub trait PerItemAction: Send + Sync {
    async fn call(&self, ctx: &ActionContext, item: Item) -> Result<Item, EngineError>;
}

/// Handler takes one item, returns a sequence of items. Results across all
/// input items are flattened onto output index 0.
#[async_trait]
pub trait PerItemMultiAction: Send + Sync {
    async fn call(&self, ctx: &ActionContext, item: Item) -> Result<Vec<Item>, EngineError>;
}

/// Handler takes one item, returns an item plus the output index to route
/// it to. Used for conditional/routing nodes.
#[async_trait]
pub trait RoutablePerItemAction: Send + Sync {
    async fn call(&self, ctx: &ActionContext, item: Item) -> Result<(Item, u32), EngineError>;
}

/// Handler receives the full input batch at once and returns one payload
/// per output index directly.
#[async_trait]
pub trait WholeBatchAction: Send + Sync {
    async fn call(
        &self,
        ctx: &ActionContext,
        items: Vec<Item>,
    ) -> Result<Vec<(u32, Vec<Item>)>, EngineError>;
}
