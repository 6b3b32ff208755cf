//! End-to-end scheduler behavior across representative workflow shapes:
//! a linear chain, a join on two upstream outputs, a conditional branch
//! with error absorption, an execution-cap cycle, cancellation, and
//! bare-scalar payload normalization.

use std::sync::Arc;

use async_trait::async_trait;
use engine::{Executor, WorkflowExecutionContext};
use engine_config::EngineDefaults;
use engine_core::{CredentialId, ExecutionId, NodeId, UserId, WorkflowId, WorkspaceId};
use engine_error::EngineError;
use engine_events::{ExecutionBroker, ExecutionEvent, HistoryRecorder, Observer};
use engine_ports::{
    CompleteWorkflowExecutionRequest, ControlPlaneClient, IntegrationExecutor, IntegrationInput,
    IntegrationOutput, IntegrationSelector, PortsError,
};
use engine_workflow::{Input, Node, NodeKind, NodeSettings, Workflow, WorkflowSettings, output_handle};
use parking_lot::Mutex;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

struct AlwaysKnownSelector;
#[async_trait]
impl IntegrationSelector for AlwaysKnownSelector {
    async fn select_executor(&self, _integration_type: &str) -> Result<bool, PortsError> {
        Ok(true)
    }
    async fn select_peeker(&self, _integration_type: &str) -> Result<bool, PortsError> {
        Ok(false)
    }
    async fn select_connection_tester(&self, _integration_type: &str) -> Result<bool, PortsError> {
        Ok(false)
    }
}

/// Dispatches by `action_type` so every scenario below can share one executor.
struct ScenarioExecutor;

#[async_trait]
impl IntegrationExecutor for ScenarioExecutor {
    async fn execute(
        &self,
        _integration_type: &str,
        input: IntegrationInput,
    ) -> Result<IntegrationOutput, PortsError> {
        match input.action_type.as_str() {
            "echo" => Ok(IntegrationOutput { items_by_output_index: vec![(0, input.items)] }),
            "append_seen" => {
                let items = input
                    .items
                    .into_iter()
                    .map(|mut item| {
                        item.insert("seen".to_string(), Value::Bool(true));
                        item
                    })
                    .collect();
                Ok(IntegrationOutput { items_by_output_index: vec![(0, items)] })
            }
            "condition_gt_three" => {
                let mut true_items = Vec::new();
                let mut false_items = Vec::new();
                for item in input.items {
                    let v = item.get("v").and_then(Value::as_i64).unwrap_or(0);
                    if v > 3 {
                        true_items.push(item);
                    } else {
                        false_items.push(item);
                    }
                }
                let mut out = Vec::new();
                if !true_items.is_empty() {
                    out.push((0, true_items));
                }
                if !false_items.is_empty() {
                    out.push((1, false_items));
                }
                Ok(IntegrationOutput { items_by_output_index: out })
            }
            "force_b" => {
                let mut item = engine_value::Item::new();
                item.insert("k".to_string(), Value::String("b".to_string()));
                Ok(IntegrationOutput { items_by_output_index: vec![(0, vec![item])] })
            }
            "raise_error" => Err(PortsError::Internal("quota exceeded".into())),
            other => Err(PortsError::Internal(format!("unknown action type {other}"))),
        }
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

/// Never resolves on its own. Used to model a node the caller cancels
/// mid-flight: the only way its call returns is via the cancellation race
/// in `execute_node`.
struct SlowEchoExecutor;

#[async_trait]
impl IntegrationExecutor for SlowEchoExecutor {
    async fn execute(
        &self,
        _integration_type: &str,
        _input: IntegrationInput,
    ) -> Result<IntegrationOutput, PortsError> {
        std::future::pending::<()>().await;
        unreachable!("cancellation must win this race before the pending future resolves")
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

struct RecordingObserver(Mutex<Vec<ExecutionEvent>>);
impl RecordingObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(Vec::new())))
    }
    fn events(&self) -> Vec<ExecutionEvent> {
        self.0.lock().clone()
    }
}
impl Observer for RecordingObserver {
    fn notify(&self, event: &ExecutionEvent) -> Result<(), EngineError> {
        self.0.lock().push(event.clone());
        Ok(())
    }
}

fn trigger(id: NodeId) -> Node {
    Node {
        id,
        kind: NodeKind::Trigger { event_type: "webhook".into() },
        integration_type: "webhook".into(),
        settings: serde_json::Map::new(),
        inputs: vec![],
        output_indices: vec![0],
        node_settings: NodeSettings::default(),
        usage_context: "workflow".into(),
    }
}

fn action(id: NodeId, action_type: &str, subscribed_to: Vec<String>, node_settings: NodeSettings) -> Node {
    Node {
        id,
        kind: NodeKind::Action { action_type: action_type.into() },
        integration_type: "http".into(),
        settings: serde_json::Map::new(),
        inputs: vec![Input { input_id: "in-0".into(), subscribed_events: subscribed_to }],
        output_indices: vec![0, 1],
        node_settings,
        usage_context: "workflow".into(),
    }
}

fn build(
    nodes: Vec<Node>,
    integration_executor: Arc<dyn IntegrationExecutor>,
    observer: Arc<RecordingObserver>,
) -> (Arc<Workflow>, Executor) {
    let workflow = Arc::new(Workflow {
        id: WorkflowId::v4(),
        workspace_id: WorkspaceId::v4(),
        settings: WorkflowSettings::default(),
        nodes,
    });
    let executor = Executor::new(
        workflow.clone(),
        Arc::new(AlwaysKnownSelector),
        integration_executor,
        Arc::new(NoopControlPlane),
        ExecutionBroker::new(vec![observer]),
        Arc::new(HistoryRecorder::new()),
        EngineDefaults::default(),
    );
    (workflow, executor)
}

fn context(workflow: &Workflow, payload: Vec<u8>) -> WorkflowExecutionContext {
    WorkflowExecutionContext::new(
        UserId::v4(),
        workflow.workspace_id,
        workflow.id,
        ExecutionId::v4(),
        payload,
        None,
        true,
        false,
    )
}

#[tokio::test]
async fn linear_trigger_then_two_actions_completes_in_order() {
    let trigger_id = NodeId::v4();
    let a_id = NodeId::v4();
    let b_id = NodeId::v4();
    let trigger_handle = output_handle(trigger_id, 0);
    let a_handle = output_handle(a_id, 0);

    let observer = RecordingObserver::new();
    let (workflow, executor) = build(
        vec![
            trigger(trigger_id),
            action(a_id, "echo", vec![trigger_handle], NodeSettings::default()),
            action(b_id, "append_seen", vec![a_handle], NodeSettings::default()),
        ],
        Arc::new(ScenarioExecutor),
        observer.clone(),
    );
    let ctx = context(&workflow, br#"[{"x":1}]"#.to_vec());

    let result = executor.execute(&ctx, trigger_id).await.unwrap();

    let events = observer.events();
    let started = events.iter().filter(|e| matches!(e, ExecutionEvent::NodeStarted { .. })).count();
    let completed: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ExecutionEvent::NodeCompleted { ordinal, .. } => Some(*ordinal),
            _ => None,
        })
        .collect();
    let workflow_completed =
        events.iter().filter(|e| matches!(e, ExecutionEvent::WorkflowCompleted { .. })).count();

    assert_eq!(started, 3);
    assert_eq!(completed, vec![1, 2, 3]);
    assert_eq!(workflow_completed, 1);
    assert_eq!(result.history_entries.len(), 3);

    let b_output = events.iter().find_map(|e| match e {
        ExecutionEvent::NodeCompleted { node_id, output_items, .. } if *node_id == b_id => {
            Some(output_items.clone())
        }
        _ => None,
    });
    let b_output = b_output.unwrap();
    assert_eq!(b_output.len(), 1);
    assert_eq!(b_output[0].0, 0);
    assert_eq!(b_output[0].1.len(), 1);
    assert_eq!(b_output[0].1[0].get("x").and_then(Value::as_i64), Some(1));
    assert_eq!(b_output[0].1[0].get("seen").and_then(Value::as_bool), Some(true));
}

#[tokio::test]
async fn join_node_subscribed_to_two_upstream_outputs_concatenates_both() {
    let trigger_id = NodeId::v4();
    let a1_id = NodeId::v4();
    let a2_id = NodeId::v4();
    let j_id = NodeId::v4();
    let trigger_handle = output_handle(trigger_id, 0);
    let a1_handle = output_handle(a1_id, 0);
    let a2_handle = output_handle(a2_id, 0);

    let observer = RecordingObserver::new();
    // J has two distinct inputs, one per upstream branch, so the join
    // coordinator buffers a waiting task until both fire.
    let j_node = Node {
        inputs: vec![
            Input { input_id: "in-0".into(), subscribed_events: vec![a1_handle] },
            Input { input_id: "in-1".into(), subscribed_events: vec![a2_handle] },
        ],
        ..action(j_id, "echo", vec![], NodeSettings::default())
    };
    let (workflow, executor) = build(
        vec![
            trigger(trigger_id),
            action(a1_id, "echo", vec![trigger_handle.clone()], NodeSettings::default()),
            action(a2_id, "force_b", vec![trigger_handle], NodeSettings::default()),
            j_node,
        ],
        Arc::new(ScenarioExecutor),
        observer.clone(),
    );
    let ctx = context(&workflow, br#"[{"k":"a"}]"#.to_vec());

    executor.execute(&ctx, trigger_id).await.unwrap();

    let events = observer.events();
    let j_completions: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ExecutionEvent::NodeCompleted { node_id, input_items, .. } if *node_id == j_id => {
                Some(input_items.clone())
            }
            _ => None,
        })
        .collect();

    assert_eq!(j_completions.len(), 1, "join node must execute exactly once");
    let items = &j_completions[0];
    assert_eq!(items.len(), 2);
    let mut ks: Vec<_> =
        items.iter().filter_map(|item| item.get("k").and_then(Value::as_str)).collect();
    ks.sort_unstable();
    assert_eq!(ks, vec!["a", "b"]);
}

#[tokio::test]
async fn condition_branch_absorbs_error_as_item_on_the_true_sink() {
    let trigger_id = NodeId::v4();
    let condition_id = NodeId::v4();
    let true_sink_id = NodeId::v4();
    let false_sink_id = NodeId::v4();
    let trigger_handle = output_handle(trigger_id, 0);
    let true_handle = output_handle(condition_id, 0);
    let false_handle = output_handle(condition_id, 1);

    let mut absorbing = NodeSettings::default();
    absorbing.return_error_as_item = true;

    let observer = RecordingObserver::new();
    let (workflow, executor) = build(
        vec![
            trigger(trigger_id),
            action(condition_id, "condition_gt_three", vec![trigger_handle], NodeSettings::default()),
            action(true_sink_id, "raise_error", vec![true_handle], absorbing),
            action(false_sink_id, "echo", vec![false_handle], NodeSettings::default()),
        ],
        Arc::new(ScenarioExecutor),
        observer.clone(),
    );
    let ctx = context(&workflow, br#"[{"v":5}]"#.to_vec());

    let result = executor.execute(&ctx, trigger_id).await.unwrap();

    let events = observer.events();
    assert!(!events.iter().any(|e| matches!(e, ExecutionEvent::NodeFailed { .. })));
    assert!(result.history_entries.iter().all(|e| e.succeeded));

    let true_sink_output = events.iter().find_map(|e| match e {
        ExecutionEvent::NodeCompleted { node_id, output_items, .. } if *node_id == true_sink_id => {
            Some(output_items.clone())
        }
        _ => None,
    });
    let true_sink_output = true_sink_output.unwrap();
    assert_eq!(true_sink_output.len(), 1);
    assert_eq!(true_sink_output[0].1.len(), 1);
    let error_message = true_sink_output[0].1[0].get("error_message").and_then(Value::as_str).unwrap();
    assert!(error_message.contains("quota exceeded"));

    // false sink never runs since v=5 routes to the true branch only.
    assert!(!events.iter().any(|e| matches!(e, ExecutionEvent::NodeStarted { node_id, .. }) if *node_id == false_sink_id));
}

#[tokio::test]
async fn self_referential_pair_aborts_with_limit_exceeded_at_default_cap() {
    let trigger_id = NodeId::v4();
    let a_id = NodeId::v4();
    let b_id = NodeId::v4();
    let trigger_handle = output_handle(trigger_id, 0);
    let a_handle = output_handle(a_id, 0);
    let b_handle = output_handle(b_id, 0);

    let observer = RecordingObserver::new();
    let a_node = Node {
        inputs: vec![Input {
            input_id: "in-0".into(),
            subscribed_events: vec![trigger_handle, b_handle],
        }],
        ..action(a_id, "echo", vec![], NodeSettings::default())
    };
    let b_node = action(b_id, "echo", vec![a_handle], NodeSettings::default());
    let (workflow, executor) =
        build(vec![trigger(trigger_id), a_node, b_node], Arc::new(ScenarioExecutor), observer.clone());
    let ctx = context(&workflow, br#"[{"x":1}]"#.to_vec());

    let result = executor.execute(&ctx, trigger_id).await;

    assert!(matches!(result, Err(EngineError::LimitExceeded { limit: 1000, .. })));

    let events = observer.events();
    assert_eq!(events.iter().filter(|e| matches!(e, ExecutionEvent::WorkflowCompleted { .. })).count(), 1);
    let a_completions = events
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::NodeCompleted { node_id, .. } if *node_id == a_id))
        .count();
    assert_eq!(a_completions, 1000);
}

#[tokio::test]
async fn cancellation_mid_loop_returns_cancelled_and_still_completes() {
    let trigger_id = NodeId::v4();
    let slow_id = NodeId::v4();
    let trigger_handle = output_handle(trigger_id, 0);

    let observer = RecordingObserver::new();
    let (workflow, executor) = build(
        vec![trigger(trigger_id), action(slow_id, "echo", vec![trigger_handle], NodeSettings::default())],
        Arc::new(SlowEchoExecutor),
        observer.clone(),
    );
    let token = CancellationToken::new();
    let ctx = context(&workflow, br#"[{"x":1}]"#.to_vec()).with_cancellation(token.clone());

    let task = tokio::spawn(async move { executor.execute(&ctx, trigger_id).await });

    // Wait for the slow node to actually start before cancelling, so the
    // cancellation is observed while dispatch is in flight rather than
    // before the loop ever dequeues it.
    for _ in 0..10_000 {
        if observer
            .events()
            .iter()
            .any(|e| matches!(e, ExecutionEvent::NodeStarted { node_id, .. } if *node_id == slow_id))
        {
            break;
        }
        tokio::task::yield_now().await;
    }

    token.cancel();

    let result = tokio::time::timeout(std::time::Duration::from_secs(5), task)
        .await
        .expect("execution did not return after cancellation")
        .expect("execution task panicked");
    assert!(matches!(result, Err(EngineError::Cancelled)));

    let events = observer.events();
    assert!(
        events.iter().any(|e| matches!(e, ExecutionEvent::NodeStarted { node_id, .. } if *node_id == slow_id))
    );
    assert!(!events.iter().any(|e| matches!(
        e,
        ExecutionEvent::NodeCompleted { node_id, .. } | ExecutionEvent::NodeFailed { node_id, .. }
        if *node_id == slow_id
    )));
    assert_eq!(events.iter().filter(|e| matches!(e, ExecutionEvent::WorkflowCompleted { .. })).count(), 1);
}

#[tokio::test]
async fn bare_number_payload_normalizes_to_a_value_item_for_the_first_action() {
    let trigger_id = NodeId::v4();
    let action_id = NodeId::v4();
    let trigger_handle = output_handle(trigger_id, 0);

    let observer = RecordingObserver::new();
    let (workflow, executor) = build(
        vec![trigger(trigger_id), action(action_id, "echo", vec![trigger_handle], NodeSettings::default())],
        Arc::new(ScenarioExecutor),
        observer.clone(),
    );
    let ctx = context(&workflow, b"42".to_vec());

    executor.execute(&ctx, trigger_id).await.unwrap();

    let events = observer.events();
    let trigger_output = events.iter().find_map(|e| match e {
        ExecutionEvent::NodeCompleted { node_id, integration_output, .. } if *node_id == trigger_id => {
            integration_output.get(&0).cloned()
        }
        _ => None,
    });
    assert_eq!(trigger_output, Some(b"42".to_vec()));

    let action_input = events.iter().find_map(|e| match e {
        ExecutionEvent::NodeCompleted { node_id, input_items, .. } if *node_id == action_id => {
            Some(input_items.clone())
        }
        _ => None,
    });
    let action_input = action_input.unwrap();
    assert_eq!(action_input.len(), 1);
    assert_eq!(action_input[0].get("value").and_then(Value::as_i64), Some(42));
}
