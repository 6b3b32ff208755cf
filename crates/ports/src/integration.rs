//! Integration dispatch ports (spec §6).
//!
//! The engine never talks to a concrete integration directly -- it resolves
//! one through [`IntegrationSelector`] and calls it through [`IntegrationExecutor`].
//! [`IntegrationPeeker`] is an optional capability surfaced for UI typeahead.

use async_trait::async_trait;
use engine_core::CredentialId;
use serde_json::{Map, Value};

use crate::error::PortsError;

/// Input to a single integration action invocation.
#[derive(Debug, Clone)]
pub struct IntegrationInput {
    /// Action-type string, as recorded on the node.
    pub action_type: String,
    /// Opaque per-node settings, parsed by the integration itself.
    pub settings: Map<String, Value>,
    /// Items to process; shape depends on the registration flavor
    /// (spec §4.7): a single item for per-item actions, the full batch
    /// for whole-batch actions.
    pub items: Vec<Map<String, Value>>,
    /// Credential to use, if the integration requires one.
    pub credential_id: Option<CredentialId>,
}

/// Output of a single integration action invocation.
#[derive(Debug, Clone)]
pub struct IntegrationOutput {
    /// Items produced on each logical output index.
    pub items_by_output_index: Vec<(u32, Vec<Map<String, Value>>)>,
}

/// Resolves an integration type string to the capabilities it supports.
#[async_trait]
pub trait IntegrationSelector: Send + Sync {
    /// Whether `integration_type` is known at all.
    async fn select_executor(&self, integration_type: &str) -> Result<bool, PortsError>;

    /// Whether `integration_type` additionally supports [`IntegrationPeeker`].
    async fn select_peeker(&self, integration_type: &str) -> Result<bool, PortsError>;

    /// Whether `integration_type` supports connection testing.
    async fn select_connection_tester(&self, integration_type: &str)
    -> Result<bool, PortsError>;
}

/// Executes a single node's action against its resolved integration.
#[async_trait]
pub trait IntegrationExecutor: Send + Sync {
    /// Run one action invocation to completion.
    async fn execute(
        &self,
        integration_type: &str,
        input: IntegrationInput,
    ) -> Result<IntegrationOutput, PortsError>;

    /// Verify that a stored credential can authenticate against the
    /// integration's remote endpoint, without executing a full action.
    async fn test_connection(
        &self,
        integration_type: &str,
        credential_id: CredentialId,
        payload: Value,
    ) -> Result<bool, PortsError>;
}

/// Result of a [`IntegrationPeeker::peek`] call: a page of browsable items.
#[derive(Debug, Clone)]
pub struct PeekResult {
    /// Items for this page.
    pub items: Vec<Map<String, Value>>,
    /// Opaque pagination cursor for the next page, if any.
    pub pagination: Option<String>,
}

/// Optional capability for browsing remote data (UI typeahead/listing).
#[async_trait]
pub trait IntegrationPeeker: Send + Sync {
    /// List a page of browsable entities of `peekable_type`.
    async fn peek(
        &self,
        integration_type: &str,
        peekable_type: &str,
        credential_id: CredentialId,
        cursor: Option<String>,
        payload: Value,
    ) -> Result<PeekResult, PortsError>;
}
