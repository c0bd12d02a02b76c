use std::collections::{HashMap, VecDeque};

use tracing::warn;

use crate::graph::WorkflowGraph;

/// Result of topological scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Node ids in a valid execution order: every node appears after all
    /// sources of its incoming edges.
    pub order: Vec<String>,
    /// Nodes excluded from the order because they sit on (or behind) a
    /// cycle, in original declaration order.
    pub excluded: Vec<String>,
}

impl Schedule {
    pub fn has_cycle(&self) -> bool {
        !self.excluded.is_empty()
    }
}

/// Compute an execution order with Kahn's algorithm.
///
/// In-degrees are seeded from the edge list; the queue starts with all
/// in-degree-0 nodes in declaration order and is consumed FIFO, so the
/// order is deterministic for a fixed input order. If a cycle exists, the
/// cyclic nodes (and anything only reachable through them) never reach
/// in-degree 0 and end up in `excluded`; the caller decides whether that
/// degrades or aborts the run.
pub fn execution_order(graph: &WorkflowGraph) -> Schedule {
    let mut in_degree: HashMap<&str, usize> = graph
        .nodes()
        .iter()
        .map(|n| (n.id.as_str(), 0))
        .collect();

    for edge in graph.edges() {
        if let Some(count) = in_degree.get_mut(edge.target.as_str()) {
            *count += 1;
        }
    }

    let mut queue: VecDeque<&str> = graph
        .nodes()
        .iter()
        .filter(|n| in_degree[n.id.as_str()] == 0)
        .map(|n| n.id.as_str())
        .collect();

    let mut order = Vec::with_capacity(graph.nodes().len());
    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());
        for edge in graph.outgoing(id) {
            let count = in_degree
                .get_mut(edge.target.as_str())
                .expect("validated edge target");
            *count -= 1;
            if *count == 0 {
                queue.push_back(edge.target.as_str());
            }
        }
    }

    let excluded: Vec<String> = if order.len() < graph.nodes().len() {
        let ordered: std::collections::HashSet<&str> =
            order.iter().map(String::as_str).collect();
        let excluded: Vec<String> = graph
            .nodes()
            .iter()
            .filter(|n| !ordered.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();
        warn!(
            nodes = ?excluded,
            "Cycle detected in workflow graph; affected nodes will not execute"
        );
        excluded
    } else {
        Vec::new()
    };

    Schedule { order, excluded }
}
