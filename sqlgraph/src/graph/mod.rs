//! State graph: nodes, fixed and conditional edges, compile and run.
//!
//! StateGraph: add nodes and edges, compile, then invoke (or stream) with state.

mod compile_error;
mod compiled;
mod conditional;
mod logging;
mod node;
mod reducer;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_state_update,
};
pub use node::Node;
pub use reducer::GraphState;
pub use state_graph::{StateGraph, DEFAULT_RECURSION_LIMIT, END, START};
