//! Action registry for looking up handlers by `(integration_type, action_type)`.

use std::sync::Arc;

use dashmap::DashMap;
use engine_error::EngineError;
use engine_value::Item;

use crate::handler::{
    ActionContext, PerItemAction, PerItemMultiAction, RoutablePerItemAction, WholeBatchAction,
};

/// One registered handler, in whichever of the four flavors it was
/// registered as.
#[derive(Clone)]
pub enum ActionHandler {
    PerItem(Arc<dyn PerItemAction>),
    PerItemMulti(Arc<dyn PerItemMultiAction>),
    Routable(Arc<dyn RoutablePerItemAction>),
    WholeBatch(Arc<dyn WholeBatchAction>),
}

/// Thread-safe registry of action handlers, keyed by integration type and
/// action type.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use engine_action::{ActionHandler, ActionRegistry};
///
/// let registry = ActionRegistry::new();
/// assert!(!registry.contains("http", "request"));
/// assert_eq!(registry.len(), 0);
/// ```
pub struct ActionRegistry {
    handlers: DashMap<(String, String), ActionHandler>,
}

impl ActionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Register a handler for `(integration_type, action_type)`.
    /// Replaces any handler already registered under the same key.
    pub fn register(
        &self,
        integration_type: impl Into<String>,
        action_type: impl Into<String>,
        handler: ActionHandler,
    ) {
        let integration_type = integration_type.into();
        let action_type = action_type.into();
        tracing::info!(%integration_type, %action_type, "registered action handler");
        self.handlers
            .insert((integration_type, action_type), handler);
    }

    #[must_use]
    pub fn get(&self, integration_type: &str, action_type: &str) -> Option<ActionHandler> {
        self.handlers
            .get(&(integration_type.to_owned(), action_type.to_owned()))
            .map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn contains(&self, integration_type: &str, action_type: &str) -> bool {
        self.handlers
            .contains_key(&(integration_type.to_owned(), action_type.to_owned()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Invoke a resolved handler against a batch of items, per its flavor's
/// dispatch rule (spec §4.7), returning one payload per output index.
pub async fn invoke(
    ctx: &ActionContext,
    handler: &ActionHandler,
    items: Vec<Item>,
) -> Result<Vec<(u32, Vec<Item>)>, EngineError> {
    match handler {
        ActionHandler::PerItem(action) => {
            let mut output = Vec::with_capacity(items.len());
            for item in items {
                output.push(action.call(ctx, item).await?);
            }
            Ok(vec![(0, output)])
        }
        ActionHandler::PerItemMulti(action) => {
            let mut output = Vec::new();
            for item in items {
                output.extend(action.call(ctx, item).await?);
            }
            Ok(vec![(0, output)])
        }
        ActionHandler::Routable(action) => {
            let mut by_index: std::collections::BTreeMap<u32, Vec<Item>> =
                std::collections::BTreeMap::new();
            for item in items {
                let (routed_item, output_index) = action.call(ctx, item).await?;
                by_index.entry(output_index).or_default().push(routed_item);
            }
            Ok(by_index.into_iter().collect())
        }
        ActionHandler::WholeBatch(action) => action.call(ctx, items).await,
    }
}
