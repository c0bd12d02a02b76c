use std::collections::HashMap;

use filament_core::types::{NodeOutcome, Record};

use crate::graph::WorkflowGraph;

/// Gather the inputs for a node from already-executed upstream outcomes.
///
/// For each incoming edge, if the source node succeeded and produced a
/// value on the edge's source handle, that value is bound under the edge's
/// target handle. A failed source, or a source that emitted nothing on the
/// port, leaves the key absent — never null-filled. Handlers are expected
/// to treat missing inputs defensively.
pub fn collect_inputs(
    graph: &WorkflowGraph,
    node_id: &str,
    results: &HashMap<String, NodeOutcome>,
) -> Record {
    let mut inputs = Record::new();

    for edge in graph.incoming(node_id) {
        let Some(outcome) = results.get(&edge.source) else {
            continue;
        };
        if !outcome.success {
            continue;
        }
        if let Some(value) = outcome.port(&edge.source_handle) {
            inputs.insert(edge.target_handle.clone(), value.clone());
        }
    }

    inputs
}
