//! The facade itself (spec §6).
//!
//! [`EngineService`] owns the long-lived ports (integration selection and
//! dispatch, the optional peeker, the control plane, the polling watermark
//! store) and the process-wide [`ExecutionRegistry`]. Each call to
//! [`EngineService::execute`] or [`EngineService::rerun_node`] builds a fresh
//! [`engine::Executor`] bound to that one call, per the engine's own
//! "construct per `Execute` call" lifecycle rule.

use std::sync::Arc;

use engine::{Executor, WorkflowExecutionContext};
use engine_config::EngineDefaults;
use engine_core::{CredentialId, ExecutionId, NodeId, UserId, WorkflowId};
use engine_events::{ExecutionBroker, ExecutionEvent, HistoryRecorder, Observer};
use engine_execution::ExecutionResult;
use engine_ports::{
    ControlPlaneClient, ExecutorScheduleManager, IntegrationExecutor, IntegrationPeeker,
    IntegrationSelector, PeekResult,
};
use engine_value::Item;
use engine_workflow::{NodeKind, Workflow};

use crate::error::ApiError;
use crate::registry::ExecutionRegistry;

/// Result of [`EngineService::handle_polling_event`].
#[derive(Debug, Clone, Default)]
pub struct PollResult {
    /// The watermark now stored for this trigger node, if any.
    pub last_modified_data: Option<serde_json::Value>,
}

/// The service-surface facade a transport layer calls into.
pub struct EngineService {
    integration_selector: Arc<dyn IntegrationSelector>,
    integration_executor: Arc<dyn IntegrationExecutor>,
    integration_peeker: Option<Arc<dyn IntegrationPeeker>>,
    control_plane: Arc<dyn ControlPlaneClient>,
    schedule_manager: Arc<dyn ExecutorScheduleManager>,
    defaults: EngineDefaults,
    registry: ExecutionRegistry,
}

impl EngineService {
    #[must_use]
    pub fn new(
        integration_selector: Arc<dyn IntegrationSelector>,
        integration_executor: Arc<dyn IntegrationExecutor>,
        integration_peeker: Option<Arc<dyn IntegrationPeeker>>,
        control_plane: Arc<dyn ControlPlaneClient>,
        schedule_manager: Arc<dyn ExecutorScheduleManager>,
        defaults: EngineDefaults,
    ) -> Self {
        Self {
            integration_selector,
            integration_executor,
            integration_peeker,
            control_plane,
            schedule_manager,
            defaults,
            registry: ExecutionRegistry::new(),
        }
    }

    /// Resolve `workflow`'s trigger node, run it to completion, and report
    /// through `subscribers` as the execution proceeds (spec §6 `Execute`).
    pub async fn execute(
        &self,
        execution_id: ExecutionId,
        workflow: Arc<Workflow>,
        trigger_event_type: &str,
        payload: serde_json::Value,
        user_id: UserId,
        is_testing: bool,
        subscribers: Vec<Arc<dyn Observer>>,
    ) -> Result<ExecutionResult, ApiError> {
        let trigger = workflow
            .nodes
            .iter()
            .find(|n| matches!(&n.kind, NodeKind::Trigger { event_type } if event_type == trigger_event_type))
            .ok_or_else(|| ApiError::UnknownTrigger {
                workflow_id: workflow.id,
                event_type: trigger_event_type.to_string(),
            })?;
        let trigger_id = trigger.id;
        let workspace_id = workflow.workspace_id;
        let workflow_id = workflow.id;

        let payload_bytes =
            serde_json::to_vec(&payload).map_err(|err| ApiError::InvalidPayload(err.to_string()))?;

        let token = self.registry.start(execution_id);
        let ctx = WorkflowExecutionContext::new(
            user_id,
            workspace_id,
            workflow_id,
            execution_id,
            payload_bytes,
            Some(trigger_id),
            is_testing,
            false,
        )
        .with_cancellation(token);

        let executor = Executor::new(
            workflow,
            self.integration_selector.clone(),
            self.integration_executor.clone(),
            self.control_plane.clone(),
            ExecutionBroker::new(subscribers),
            Arc::new(HistoryRecorder::new()),
            self.defaults,
        );
        self.registry.register_stream(execution_id, executor.stream_handle());

        let outcome = executor.execute(&ctx, trigger_id).await;
        self.registry.finish(execution_id);
        outcome.map_err(ApiError::from)
    }

    /// Subscribe to a tracked execution's best-effort event stream (spec
    /// §4.4 "Stream channel"). Returns `None` if `execution_id` is not
    /// currently running through this service.
    #[must_use]
    pub fn subscribe_stream(&self, execution_id: ExecutionId) -> Option<tokio::sync::broadcast::Receiver<ExecutionEvent>> {
        self.registry.subscribe_stream(execution_id)
    }

    /// Replay one node against caller-supplied items without fanning out to
    /// its downstream edges (spec §6 `RerunNode`).
    pub async fn rerun_node(
        &self,
        execution_id: ExecutionId,
        workflow: Arc<Workflow>,
        node_id: NodeId,
        prior_items: Vec<Item>,
        user_id: UserId,
    ) -> Result<ExecutionResult, ApiError> {
        let workspace_id = workflow.workspace_id;
        let workflow_id = workflow.id;

        let ctx = WorkflowExecutionContext::new(
            user_id,
            workspace_id,
            workflow_id,
            execution_id,
            Vec::new(),
            Some(node_id),
            true,
            true,
        );

        let executor = Executor::new(
            workflow,
            self.integration_selector.clone(),
            self.integration_executor.clone(),
            self.control_plane.clone(),
            ExecutionBroker::new(Vec::new()),
            Arc::new(HistoryRecorder::new()),
            self.defaults,
        );

        executor.rerun_node(&ctx, node_id, prior_items).await.map_err(ApiError::from)
    }

    /// Fetch or advance a polling trigger's watermark (spec §6
    /// `HandlePollingEvent`). Passing `new_watermark` overwrites the stored
    /// value; passing `None` only reads it back.
    pub async fn handle_polling_event(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        new_watermark: Option<serde_json::Value>,
    ) -> Result<PollResult, ApiError> {
        if let Some(data) = new_watermark {
            self.schedule_manager.set_last_modified_data(workflow_id, node_id, data.clone()).await?;
            return Ok(PollResult { last_modified_data: Some(data) });
        }
        let last_modified_data = self.schedule_manager.get_last_modified_data(workflow_id, node_id).await?;
        Ok(PollResult { last_modified_data })
    }

    /// Verify a stored credential against `integration_type`'s remote
    /// endpoint (spec §6 `TestConnection`).
    pub async fn test_connection(
        &self,
        integration_type: &str,
        credential_id: CredentialId,
        payload: serde_json::Value,
    ) -> Result<bool, ApiError> {
        self.integration_executor
            .test_connection(integration_type, credential_id, payload)
            .await
            .map_err(ApiError::from)
    }

    /// Browse a page of remote entities (spec §6 `PeekData`). Fails with
    /// [`ApiError::PeekNotSupported`] when no peeker was configured.
    pub async fn peek_data(
        &self,
        integration_type: &str,
        peekable_type: &str,
        credential_id: CredentialId,
        cursor: Option<String>,
        payload: serde_json::Value,
    ) -> Result<PeekResult, ApiError> {
        let peeker = self.integration_peeker.as_ref().ok_or_else(|| ApiError::PeekNotSupported {
            integration_type: integration_type.to_string(),
        })?;
        peeker
            .peek(integration_type, peekable_type, credential_id, cursor, payload)
            .await
            .map_err(ApiError::from)
    }

    /// Cancel a tracked in-flight execution. Returns `false` if `execution_id`
    /// is not currently tracked (already finished, or never started here).
    pub fn cancel_execution(&self, execution_id: ExecutionId) -> bool {
        self.registry.cancel(execution_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use engine_core::{WorkspaceId};
    use engine_ports::{
        CompleteWorkflowExecutionRequest, IntegrationInput, IntegrationOutput, PortsError,
    };
    use engine_workflow::{Input, Node, NodeSettings, WorkflowSettings, output_handle};

    struct AlwaysKnownSelector;
    #[async_trait]
    impl IntegrationSelector for AlwaysKnownSelector {
        async fn select_executor(&self, _integration_type: &str) -> Result<bool, PortsError> {
            Ok(true)
        }
        async fn select_peeker(&self, _integration_type: &str) -> Result<bool, PortsError> {
            Ok(true)
        }
        async fn select_connection_tester(&self, _integration_type: &str) -> Result<bool, PortsError> {
            Ok(true)
        }
    }

    struct EchoExecutor;
    #[async_trait]
    impl IntegrationExecutor for EchoExecutor {
        async fn execute(
            &self,
            _integration_type: &str,
            input: IntegrationInput,
        ) -> Result<IntegrationOutput, PortsError> {
            Ok(IntegrationOutput { items_by_output_index: vec![(0, input.items)] })
        }
        async fn test_connection(
            &self,
            _integration_type: &str,
            _credential_id: CredentialId,
            _payload: serde_json::Value,
        ) -> Result<bool, PortsError> {
            Ok(true)
        }
    }

    struct NoopControlPlane;
    #[async_trait]
    impl ControlPlaneClient for NoopControlPlane {
        async fn complete_workflow_execution(
            &self,
            _request: CompleteWorkflowExecutionRequest,
        ) -> Result<(), PortsError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct InMemorySchedule {
        stored: parking_lot::Mutex<Option<serde_json::Value>>,
    }
    #[async_trait]
    impl ExecutorScheduleManager for InMemorySchedule {
        async fn get_last_modified_data(
            &self,
            _workflow_id: WorkflowId,
            _node_id: NodeId,
        ) -> Result<Option<serde_json::Value>, PortsError> {
            Ok(self.stored.lock().clone())
        }
        async fn set_last_modified_data(
            &self,
            _workflow_id: WorkflowId,
            _node_id: NodeId,
            data: serde_json::Value,
        ) -> Result<(), PortsError> {
            *self.stored.lock() = Some(data);
            Ok(())
        }
    }

    fn trigger_workflow() -> Arc<Workflow> {
        let trigger_id = NodeId::v4();
        let trigger = Node {
            id: trigger_id,
            kind: NodeKind::Trigger { event_type: "webhook".into() },
            integration_type: "http".into(),
            settings: serde_json::Map::new(),
            inputs: vec![],
            output_indices: vec![0],
            node_settings: NodeSettings::default(),
            usage_context: "workflow".into(),
        };
        Arc::new(Workflow {
            id: WorkflowId::v4(),
            workspace_id: WorkspaceId::v4(),
            settings: WorkflowSettings::default(),
            nodes: vec![trigger],
        })
    }

    fn service() -> EngineService {
        EngineService::new(
            Arc::new(AlwaysKnownSelector),
            Arc::new(EchoExecutor),
            None,
            Arc::new(NoopControlPlane),
            Arc::new(InMemorySchedule::default()),
            EngineDefaults::default(),
        )
    }

    #[tokio::test]
    async fn execute_resolves_trigger_and_runs_to_completion() {
        let svc = service();
        let workflow = trigger_workflow();

        let result = svc
            .execute(
                ExecutionId::v4(),
                workflow,
                "webhook",
                serde_json::json!({"x": 1}),
                UserId::v4(),
                false,
                vec![],
            )
            .await
            .unwrap();

        assert_eq!(result.history_entries.len(), 1);
    }

    #[tokio::test]
    async fn execute_with_unknown_trigger_event_fails() {
        let svc = service();
        let workflow = trigger_workflow();

        let err = svc
            .execute(
                ExecutionId::v4(),
                workflow,
                "no-such-event",
                serde_json::json!({}),
                UserId::v4(),
                false,
                vec![],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::UnknownTrigger { .. }));
    }

    #[tokio::test]
    async fn cancel_execution_of_unknown_id_returns_false() {
        let svc = service();
        assert!(!svc.cancel_execution(ExecutionId::v4()));
    }

    #[tokio::test]
    async fn peek_data_without_a_configured_peeker_fails() {
        let svc = service();
        let err = svc
            .peek_data("http", "channels", CredentialId::v4(), None, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PeekNotSupported { .. }));
    }

    #[tokio::test]
    async fn handle_polling_event_round_trips_through_the_schedule_manager() {
        let svc = service();
        let workflow_id = WorkflowId::v4();
        let node_id = NodeId::v4();

        let initial = svc.handle_polling_event(workflow_id, node_id, None).await.unwrap();
        assert!(initial.last_modified_data.is_none());

        let watermark = serde_json::json!({"cursor": "abc"});
        let updated =
            svc.handle_polling_event(workflow_id, node_id, Some(watermark.clone())).await.unwrap();
        assert_eq!(updated.last_modified_data, Some(watermark.clone()));

        let read_back = svc.handle_polling_event(workflow_id, node_id, None).await.unwrap();
        assert_eq!(read_back.last_modified_data, Some(watermark));
    }

    #[tokio::test]
    async fn rerun_node_replays_without_downstream_fan_out() {
        let svc = service();
        let node_id = NodeId::v4();
        let target = Node {
            id: node_id,
            kind: NodeKind::Action { action_type: "echo".into() },
            integration_type: "http".into(),
            settings: serde_json::Map::new(),
            inputs: vec![Input {
                input_id: "in-0".into(),
                subscribed_events: vec![output_handle(NodeId::v4(), 0)],
            }],
            output_indices: vec![0],
            node_settings: NodeSettings::default(),
            usage_context: "workflow".into(),
        };
        let workflow = Arc::new(Workflow {
            id: WorkflowId::v4(),
            workspace_id: WorkspaceId::v4(),
            settings: WorkflowSettings::default(),
            nodes: vec![target],
        });

        let mut item = Item::new();
        item.insert("k".to_string(), serde_json::Value::String("v".into()));

        let result = svc
            .rerun_node(ExecutionId::v4(), workflow, node_id, vec![item], UserId::v4())
            .await
            .unwrap();

        assert_eq!(result.history_entries.len(), 1);
    }
}
