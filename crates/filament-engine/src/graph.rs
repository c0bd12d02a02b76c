use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use filament_core::error::{FilamentError, Result};

use crate::edge::WorkflowEdge;
use crate::node::WorkflowNode;

/// A validated workflow graph.
///
/// Construction checks the structural invariants once: node ids are unique,
/// every edge references existing nodes, and every edge handle is a port
/// the node actually declares. The graph may be disconnected; nodes with no
/// incoming edges are roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawGraph", into = "RawGraph")]
pub struct WorkflowGraph {
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
    index: HashMap<String, usize>,
}

/// Wire shape: `{ "nodes": [...], "edges": [...] }`.
#[derive(Serialize, Deserialize)]
struct RawGraph {
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
}

impl TryFrom<RawGraph> for WorkflowGraph {
    type Error = FilamentError;

    fn try_from(raw: RawGraph) -> Result<Self> {
        WorkflowGraph::new(raw.nodes, raw.edges)
    }
}

impl From<WorkflowGraph> for RawGraph {
    fn from(graph: WorkflowGraph) -> Self {
        Self {
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }
}

impl WorkflowGraph {
    /// Build and validate a graph.
    pub fn new(nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(FilamentError::DuplicateNode(node.id.clone()));
            }
        }

        for edge in &edges {
            let source = index
                .get(&edge.source)
                .map(|&i| &nodes[i])
                .ok_or_else(|| FilamentError::UnknownNode {
                    edge: edge.id.clone(),
                    node: edge.source.clone(),
                })?;
            let target = index
                .get(&edge.target)
                .map(|&i| &nodes[i])
                .ok_or_else(|| FilamentError::UnknownNode {
                    edge: edge.id.clone(),
                    node: edge.target.clone(),
                })?;

            if !source.outputs.contains(&edge.source_handle) {
                return Err(FilamentError::UnknownPort {
                    edge: edge.id.clone(),
                    node: source.id.clone(),
                    port: edge.source_handle.clone(),
                });
            }
            if !target.inputs.contains(&edge.target_handle) {
                return Err(FilamentError::UnknownPort {
                    edge: edge.id.clone(),
                    node: target.id.clone(),
                    port: edge.target_handle.clone(),
                });
            }
        }

        Ok(Self {
            nodes,
            edges,
            index,
        })
    }

    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[WorkflowEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Edges whose target is `node_id`, in declaration order.
    pub fn incoming<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a WorkflowEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Edges whose source is `node_id`, in declaration order.
    pub fn outgoing<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a WorkflowEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }
}
