use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use filament_core::config::{CyclePolicy, ErrorPolicy, RunConfig};
use filament_core::error::{FilamentError, Result};
use filament_core::traits::TextModel;
use filament_core::types::{LogStatus, NodeOutcome, NodeState, Record, RunReport};
use filament_handlers::HandlerRegistry;

use crate::collect::collect_inputs;
use crate::context::ExecutionContext;
use crate::graph::WorkflowGraph;
use crate::node::WorkflowNode;
use crate::schedule::execution_order;

/// Executes a workflow graph.
///
/// Nodes run strictly sequentially in topological order; each node's
/// handler is awaited to completion before the next begins. A node failure
/// is isolated to that node's outcome — under the default
/// `ContinueOnError` policy, downstream nodes still run with whatever
/// inputs remain collectable.
pub struct WorkflowExecutor {
    graph: WorkflowGraph,
    registry: Arc<HandlerRegistry>,
    model: Option<Arc<dyn TextModel>>,
}

impl WorkflowExecutor {
    pub fn new(graph: WorkflowGraph, registry: Arc<HandlerRegistry>) -> Self {
        Self {
            graph,
            registry,
            model: None,
        }
    }

    /// Attach a model client used for optional API-key validation.
    pub fn with_model(mut self, model: Arc<dyn TextModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// Execute the whole graph under the given run configuration.
    ///
    /// Preconditions (empty API key, key validation, `CyclePolicy::Fail`)
    /// are checked before any node leaves `Idle`.
    pub async fn execute(&self, config: &RunConfig) -> Result<RunReport> {
        config.require_api_key()?;

        if config.validate_key {
            if let Some(model) = &self.model {
                model
                    .validate_key(&config.api_key, &config.model_id)
                    .await?;
            }
        }

        let schedule = execution_order(&self.graph);
        if schedule.has_cycle() && config.cycle_policy == CyclePolicy::Fail {
            return Err(FilamentError::CycleDetected(schedule.excluded));
        }

        let start = Instant::now();
        let mut context = ExecutionContext::new(&self.graph);
        let mut skipped = schedule.excluded.clone();

        info!(
            run_id = %context.run_id(),
            nodes = schedule.order.len(),
            excluded = schedule.excluded.len(),
            "Starting workflow run"
        );

        for (position, node_id) in schedule.order.iter().enumerate() {
            let node = self
                .graph
                .node(node_id)
                .expect("scheduled node exists in graph");

            let outcome = self.execute_node(node, config, &mut context).await;
            let failed = !outcome.success;
            context.record(node_id, outcome);

            if failed && config.error_policy == ErrorPolicy::FailFast {
                let remaining = &schedule.order[position + 1..];
                warn!(
                    node_id = %node_id,
                    remaining = remaining.len(),
                    "Halting run after node failure (fail-fast)"
                );
                skipped.extend(remaining.iter().cloned());
                break;
            }
        }

        let total_elapsed_ms = start.elapsed().as_millis() as u64;
        let report = context.into_report(skipped, total_elapsed_ms);
        info!(
            run_id = %report.run_id,
            elapsed_ms = total_elapsed_ms,
            succeeded = report.succeeded,
            "Workflow run finished"
        );
        Ok(report)
    }

    /// Run one node through its `idle → running → completed|failed` cycle.
    async fn execute_node(
        &self,
        node: &WorkflowNode,
        config: &RunConfig,
        context: &mut ExecutionContext,
    ) -> NodeOutcome {
        context.set_state(&node.id, NodeState::Running);
        context.log(
            &node.id,
            LogStatus::Start,
            format!("Executing node: {}", node.display_name()),
        );
        info!(node_id = %node.id, kind = %node.kind, "Executing node");

        let inputs = collect_inputs(&self.graph, &node.id, context.results());
        let parameters = effective_parameters(node, config);

        let node_start = Instant::now();
        let result = match self.registry.resolve(&node.kind) {
            Ok(handler) => handler.execute(&inputs, &parameters).await,
            Err(e) => Err(e),
        };
        let elapsed_ms = node_start.elapsed().as_millis() as u64;

        match result {
            Ok(data) => {
                context.set_state(&node.id, NodeState::Completed);
                context.log(
                    &node.id,
                    LogStatus::Success,
                    format!("Node completed: {}", node.display_name()),
                );
                debug!(node_id = %node.id, elapsed_ms, "Node execution complete");
                NodeOutcome::success(data)
            }
            Err(e) => {
                let message = e.to_string();
                context.set_state(&node.id, NodeState::Failed);
                context.log(
                    &node.id,
                    LogStatus::Error,
                    format!("Node failed: {}", message),
                );
                error!(node_id = %node.id, error = %message, "Node execution failed");
                NodeOutcome::failure(message)
            }
        }
    }
}

/// Merge node-declared parameters with run-scoped settings.
///
/// The API key is a run secret and always wins; generation settings are
/// defaults the node may override.
fn effective_parameters(node: &WorkflowNode, config: &RunConfig) -> Record {
    let mut parameters = node.parameters.clone();
    parameters.insert("api_key".into(), serde_json::json!(config.api_key));
    parameters
        .entry("model".to_string())
        .or_insert_with(|| serde_json::json!(config.model_id));
    parameters
        .entry("temperature".to_string())
        .or_insert_with(|| serde_json::json!(config.temperature));
    parameters
        .entry("max_output_tokens".to_string())
        .or_insert_with(|| serde_json::json!(config.max_output_tokens));
    parameters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::WorkflowEdge;
    use crate::node::WorkflowNode;
    use filament_core::traits::NodeHandler;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes its collected inputs as outputs and counts invocations.
    struct EchoHandler {
        calls: Arc<AtomicUsize>,
    }

    impl NodeHandler for EchoHandler {
        fn kind(&self) -> &str {
            "echo"
        }

        fn execute(&self, inputs: &Record, _parameters: &Record) -> BoxFuture<'_, Result<Record>> {
            let inputs = inputs.clone();
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(inputs) })
        }
    }

    /// Emits a fixed value on the "text" port.
    struct EmitHandler;

    impl NodeHandler for EmitHandler {
        fn kind(&self) -> &str {
            "emit"
        }

        fn execute(&self, _inputs: &Record, _parameters: &Record) -> BoxFuture<'_, Result<Record>> {
            Box::pin(async move {
                let mut outputs = Record::new();
                outputs.insert("text".into(), serde_json::json!("hello"));
                Ok(outputs)
            })
        }
    }

    /// Always fails.
    struct ExplodeHandler;

    impl NodeHandler for ExplodeHandler {
        fn kind(&self) -> &str {
            "explode"
        }

        fn execute(&self, _inputs: &Record, _parameters: &Record) -> BoxFuture<'_, Result<Record>> {
            Box::pin(async move {
                Err(FilamentError::ModelRequest("synthetic failure".into()))
            })
        }
    }

    fn registry(calls: Arc<AtomicUsize>) -> Arc<HandlerRegistry> {
        let mut registry = HandlerRegistry::new();
        registry.register(EchoHandler { calls });
        registry.register(EmitHandler);
        registry.register(ExplodeHandler);
        Arc::new(registry)
    }

    fn two_node_graph(first_kind: &str) -> WorkflowGraph {
        WorkflowGraph::new(
            vec![
                WorkflowNode::new("a", first_kind).with_outputs(["text"]),
                WorkflowNode::new("b", "echo")
                    .with_inputs(["prompt"])
                    .with_outputs(["prompt"]),
            ],
            vec![WorkflowEdge::connect("a", "text", "b", "prompt")],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_value_flows_along_edge_ports() {
        let executor = WorkflowExecutor::new(
            two_node_graph("emit"),
            registry(Arc::new(AtomicUsize::new(0))),
        );
        let report = executor.execute(&RunConfig::new("sk-test")).await.unwrap();

        assert!(report.succeeded);
        let b = report.outcome("b").unwrap();
        assert!(b.success);
        // a.text → b.prompt: the echo handler saw "hello" under "prompt"
        assert_eq!(b.port("prompt"), Some(&serde_json::json!("hello")));
        assert_eq!(report.state("a"), NodeState::Completed);
        assert_eq!(report.state("b"), NodeState::Completed);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_downstream_still_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = WorkflowExecutor::new(two_node_graph("explode"), registry(calls.clone()));
        let report = executor.execute(&RunConfig::new("sk-test")).await.unwrap();

        assert!(!report.succeeded);
        let a = report.outcome("a").unwrap();
        assert!(!a.success);
        assert!(a.error.as_deref().unwrap().contains("synthetic failure"));

        // b still executed, with the input key absent (not null-filled)
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let b = report.outcome("b").unwrap();
        assert!(b.success);
        let data = b.data.as_ref().unwrap();
        assert!(!data.contains_key("prompt"));
        assert_eq!(report.state("a"), NodeState::Failed);
        assert_eq!(report.state("b"), NodeState::Completed);
    }

    #[tokio::test]
    async fn test_fail_fast_leaves_downstream_idle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = WorkflowExecutor::new(two_node_graph("explode"), registry(calls.clone()));

        let mut config = RunConfig::new("sk-test");
        config.error_policy = ErrorPolicy::FailFast;
        let report = executor.execute(&config).await.unwrap();

        assert!(!report.succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(report.outcome("b").is_none());
        assert_eq!(report.state("b"), NodeState::Idle);
        assert_eq!(report.skipped, vec!["b"]);
    }

    #[tokio::test]
    async fn test_empty_api_key_fails_before_any_node_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = WorkflowExecutor::new(two_node_graph("emit"), registry(calls.clone()));

        let err = executor.execute(&RunConfig::default()).await.unwrap_err();
        assert!(matches!(err, FilamentError::MissingApiKey));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_node_type_is_a_node_failure() {
        let graph = WorkflowGraph::new(
            vec![WorkflowNode::new("a", "hologram").with_outputs(["text"])],
            vec![],
        )
        .unwrap();
        let executor = WorkflowExecutor::new(graph, registry(Arc::new(AtomicUsize::new(0))));
        let report = executor.execute(&RunConfig::new("sk-test")).await.unwrap();

        let a = report.outcome("a").unwrap();
        assert!(!a.success);
        assert!(a.error.as_deref().unwrap().contains("unsupported node type"));
        assert_eq!(report.state("a"), NodeState::Failed);
    }

    fn cyclic_graph() -> WorkflowGraph {
        let port_node = |id: &str, kind: &str| {
            WorkflowNode::new(id, kind)
                .with_inputs(["prompt"])
                .with_outputs(["text"])
        };
        WorkflowGraph::new(
            vec![
                WorkflowNode::new("a", "emit").with_outputs(["text"]),
                port_node("x", "echo"),
                port_node("y", "echo"),
            ],
            vec![
                WorkflowEdge::connect("x", "text", "y", "prompt"),
                WorkflowEdge::connect("y", "text", "x", "prompt"),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_cycle_warn_policy_excludes_members() {
        let executor =
            WorkflowExecutor::new(cyclic_graph(), registry(Arc::new(AtomicUsize::new(0))));
        let report = executor.execute(&RunConfig::new("sk-test")).await.unwrap();

        assert!(report.outcome("a").is_some());
        assert!(report.outcome("x").is_none());
        assert!(report.outcome("y").is_none());
        assert_eq!(report.skipped, vec!["x", "y"]);
        assert_eq!(report.state("x"), NodeState::Idle);
    }

    #[tokio::test]
    async fn test_cycle_fail_policy_aborts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = WorkflowExecutor::new(cyclic_graph(), registry(calls.clone()));

        let mut config = RunConfig::new("sk-test");
        config.cycle_policy = CyclePolicy::Fail;
        let err = executor.execute(&config).await.unwrap_err();
        assert!(matches!(err, FilamentError::CycleDetected(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_key_validation_failure_aborts_run() {
        let model = Arc::new(filament_llm::StaticModel::failing("invalid key"));
        let executor = WorkflowExecutor::new(
            two_node_graph("emit"),
            registry(Arc::new(AtomicUsize::new(0))),
        )
        .with_model(model);

        let mut config = RunConfig::new("sk-test");
        config.validate_key = true;
        let err = executor.execute(&config).await.unwrap_err();
        assert!(matches!(err, FilamentError::ModelRequest(_)));
    }

    #[tokio::test]
    async fn test_logs_record_start_and_outcome() {
        let executor = WorkflowExecutor::new(
            two_node_graph("emit"),
            registry(Arc::new(AtomicUsize::new(0))),
        );
        let report = executor.execute(&RunConfig::new("sk-test")).await.unwrap();

        let statuses: Vec<_> = report
            .logs
            .iter()
            .map(|l| (l.node_id.as_str(), l.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("a", LogStatus::Start),
                ("a", LogStatus::Success),
                ("b", LogStatus::Start),
                ("b", LogStatus::Success),
            ]
        );
    }

    #[test]
    fn test_effective_parameters_merge() {
        let node = WorkflowNode::new("n", "llm")
            .with_parameter("temperature", serde_json::json!(0.1))
            .with_parameter("api_key", serde_json::json!("node-key-ignored"));

        let config = RunConfig::new("sk-secret");
        let parameters = effective_parameters(&node, &config);

        // Run secret always wins
        assert_eq!(parameters.get("api_key"), Some(&serde_json::json!("sk-secret")));
        // Node-level generation settings win over run defaults
        assert_eq!(parameters.get("temperature"), Some(&serde_json::json!(0.1)));
        // Run defaults fill the gaps
        assert_eq!(
            parameters.get("model"),
            Some(&serde_json::json!("gemini-2.0-flash"))
        );
        assert_eq!(
            parameters.get("max_output_tokens"),
            Some(&serde_json::json!(2048))
        );
    }
}
