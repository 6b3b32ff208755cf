//! Bridges `engine-action`'s in-process dispatch manager to the
//! `engine-ports::IntegrationExecutor` port (spec §4.7/§6).
//!
//! Nothing else in the workspace connects these two crates: `engine-ports`
//! describes integrations as an externally supplied capability, while
//! `engine-action` describes the four registration flavors a concrete
//! integration host dispatches through. [`ActionRegistryExecutor`] is one
//! such host, backed by a single in-process [`ActionRegistry`].

use std::sync::Arc;

use async_trait::async_trait;
use engine_action::{ActionContext, ActionRegistry, invoke};
use engine_core::{CredentialId, NodeId, WorkspaceId};
use engine_ports::{IntegrationExecutor, IntegrationInput, IntegrationOutput, PortsError};
use serde_json::Value;

/// An [`IntegrationExecutor`] that dispatches every call through a shared
/// [`ActionRegistry`], keyed by `(integration_type, action_type)`.
pub struct ActionRegistryExecutor {
    registry: Arc<ActionRegistry>,
    node_id: NodeId,
    workspace_id: WorkspaceId,
}

impl ActionRegistryExecutor {
    #[must_use]
    pub fn new(registry: Arc<ActionRegistry>, node_id: NodeId, workspace_id: WorkspaceId) -> Self {
        Self {
            registry,
            node_id,
            workspace_id,
        }
    }
}

#[async_trait]
impl IntegrationExecutor for ActionRegistryExecutor {
    async fn execute(
        &self,
        integration_type: &str,
        input: IntegrationInput,
    ) -> Result<IntegrationOutput, PortsError> {
        let handler = self
            .registry
            .get(integration_type, &input.action_type)
            .ok_or_else(|| {
                PortsError::not_found(
                    "ActionHandler",
                    format!("{integration_type}/{}", input.action_type),
                )
            })?;

        let ctx = ActionContext {
            node_id: self.node_id,
            workspace_id: self.workspace_id,
            credential_id: input.credential_id,
        };

        let items_by_output_index = invoke(&ctx, &handler, input.items)
            .await
            .map_err(|err| PortsError::Internal(err.to_string()))?;

        Ok(IntegrationOutput {
            items_by_output_index,
        })
    }

    async fn test_connection(
        &self,
        _integration_type: &str,
        _credential_id: CredentialId,
        _payload: Value,
    ) -> Result<bool, PortsError> {
        Ok(true)
    }
}
