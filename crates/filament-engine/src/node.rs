use serde::{Deserialize, Serialize};

use filament_core::types::Record;

/// A single typed processing step in the workflow graph.
///
/// The `kind` string selects the handler; `inputs` and `outputs` declare
/// the ports edges may attach to. Nodes are immutable during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique identifier for this node.
    pub id: String,
    /// Node type (handler key), e.g. "input", "llm", "summarization".
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// Open key-value parameter bag (model name, expression, thresholds...).
    #[serde(default)]
    pub parameters: Record,
    /// Declared input port names.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Declared output port names.
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl WorkflowNode {
    /// Create a new node with minimal configuration.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            label: String::new(),
            parameters: Record::new(),
            inputs: vec![],
            outputs: vec![],
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set a single parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Declare the input ports.
    pub fn with_inputs(mut self, ports: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.inputs = ports.into_iter().map(Into::into).collect();
        self
    }

    /// Declare the output ports.
    pub fn with_outputs(mut self, ports: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.outputs = ports.into_iter().map(Into::into).collect();
        self
    }

    /// Display name: the label if set, otherwise the id.
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}
