use serde::{Deserialize, Serialize};

/// A directed data dependency between one node's output port and another
/// node's input port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    /// Unique identifier for this edge.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Output port on the source node.
    pub source_handle: String,
    /// Target node id.
    pub target: String,
    /// Input port on the target node.
    pub target_handle: String,
}

impl WorkflowEdge {
    /// Connect `source.source_handle` to `target.target_handle`, deriving
    /// the edge id from the endpoints.
    pub fn connect(
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let source_handle = source_handle.into();
        let target = target.into();
        let target_handle = target_handle.into();
        Self {
            id: format!("{}.{}->{}.{}", source, source_handle, target, target_handle),
            source,
            source_handle,
            target,
            target_handle,
        }
    }
}
