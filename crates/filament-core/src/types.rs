use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Flat key-value record passed into and out of node handlers.
///
/// Keys are port names; values are arbitrary JSON.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Unique run identifier.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transient per-node state during a run. Used for status reporting only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Per-node outcome of one run.
///
/// Written exactly once per node per run and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeOutcome {
    pub fn success(data: Record) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Read a single output port value, if present.
    pub fn port(&self, name: &str) -> Option<&serde_json::Value> {
        self.data.as_ref().and_then(|d| d.get(name))
    }
}

/// Status tag on a log entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Start,
    Success,
    Error,
    Warning,
}

/// A single timestamped entry in the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub node_id: String,
    pub status: LogStatus,
    pub message: String,
}

impl LogEntry {
    pub fn new(node_id: impl Into<String>, status: LogStatus, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            node_id: node_id.into(),
            status,
            message: message.into(),
        }
    }
}

/// Result of executing an entire workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique id of this run.
    pub run_id: RunId,
    /// Per-node outcomes, keyed by node id.
    pub results: HashMap<String, NodeOutcome>,
    /// Final per-node states, keyed by node id.
    pub states: HashMap<String, NodeState>,
    /// Append-only run log in event order.
    pub logs: Vec<LogEntry>,
    /// Node ids excluded from execution (cyclic, or unreached after a
    /// fail-fast stop).
    pub skipped: Vec<String>,
    /// Total execution time in milliseconds.
    pub total_elapsed_ms: u64,
    /// Whether every executed node succeeded.
    pub succeeded: bool,
}

impl RunReport {
    /// Outcome for a single node, if it was executed.
    pub fn outcome(&self, node_id: &str) -> Option<&NodeOutcome> {
        self.results.get(node_id)
    }

    /// Final state for a node (Idle if the node never entered the run).
    pub fn state(&self, node_id: &str) -> NodeState {
        self.states.get(node_id).copied().unwrap_or_default()
    }
}
