//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when edges reference unknown nodes, the
//! entry is ambiguous, or a node has no way forward.

use thiserror::Error;

/// Error when compiling a state graph.
#[derive(Debug, Error)]
pub enum CompilationError {
    /// A node id in an edge was not registered via `add_node` (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge has from_id == START.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// Neither a fixed edge nor a conditional path map can reach END.
    #[error("graph has no edge to END")]
    MissingEnd,

    /// Edges are inconsistent (e.g. two edges from START, two fixed edges from one node).
    #[error("invalid edges: {0}")]
    InvalidChain(String),

    /// A node has both an outgoing edge and conditional edges; it must have exactly one.
    #[error("node has both edge and conditional edges: {0}")]
    NodeHasBothEdgeAndConditional(String),

    /// A value in a conditional path_map is not a valid node id or END.
    #[error("conditional path_map invalid target: {0}")]
    InvalidConditionalPathMap(String),

    /// A registered node has neither a fixed edge nor conditional edges.
    #[error("node has no outgoing edge: {0}")]
    NoOutgoingEdge(String),
}
