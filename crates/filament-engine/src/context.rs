use std::collections::HashMap;

use filament_core::types::{
    LogEntry, LogStatus, NodeOutcome, NodeState, Record, RunId, RunReport,
};

use crate::graph::WorkflowGraph;

/// Process-local state scoped to a single run.
///
/// Created at run start, converted into a [`RunReport`] at the end, and
/// discarded. Nothing here persists across runs.
#[derive(Debug)]
pub struct ExecutionContext {
    run_id: RunId,
    /// Run-scoped variables available to future extensions; currently only
    /// carried through to keep the report self-describing.
    pub variables: Record,
    logs: Vec<LogEntry>,
    results: HashMap<String, NodeOutcome>,
    states: HashMap<String, NodeState>,
}

impl ExecutionContext {
    /// Initialize with every graph node in the `Idle` state.
    pub fn new(graph: &WorkflowGraph) -> Self {
        Self {
            run_id: RunId::new(),
            variables: Record::new(),
            logs: Vec::new(),
            results: HashMap::with_capacity(graph.nodes().len()),
            states: graph
                .nodes()
                .iter()
                .map(|n| (n.id.clone(), NodeState::Idle))
                .collect(),
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Append a timestamped log entry.
    pub fn log(&mut self, node_id: &str, status: LogStatus, message: impl Into<String>) {
        self.logs.push(LogEntry::new(node_id, status, message));
    }

    pub fn set_state(&mut self, node_id: &str, state: NodeState) {
        self.states.insert(node_id.to_string(), state);
    }

    pub fn state(&self, node_id: &str) -> NodeState {
        self.states.get(node_id).copied().unwrap_or_default()
    }

    /// Record a node's outcome. Outcomes are write-once: a second write for
    /// the same node is ignored.
    pub fn record(&mut self, node_id: &str, outcome: NodeOutcome) {
        self.results.entry(node_id.to_string()).or_insert(outcome);
    }

    pub fn results(&self) -> &HashMap<String, NodeOutcome> {
        &self.results
    }

    pub fn outcome(&self, node_id: &str) -> Option<&NodeOutcome> {
        self.results.get(node_id)
    }

    /// Consume the context into the final report.
    pub fn into_report(self, skipped: Vec<String>, total_elapsed_ms: u64) -> RunReport {
        let succeeded = self.results.values().all(|r| r.success);
        RunReport {
            run_id: self.run_id,
            results: self.results,
            states: self.states,
            logs: self.logs,
            skipped,
            total_elapsed_ms,
            succeeded,
        }
    }
}
