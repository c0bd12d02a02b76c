pub mod collect;
pub mod context;
pub mod edge;
pub mod executor;
pub mod graph;
pub mod node;
pub mod schedule;

pub use context::ExecutionContext;
pub use edge::WorkflowEdge;
pub use executor::WorkflowExecutor;
pub use graph::WorkflowGraph;
pub use node::WorkflowNode;
pub use schedule::{execution_order, Schedule};
