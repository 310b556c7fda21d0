//! Logging utilities for graph execution.
//!
//! Structured `tracing` events for graph start/complete/error, node execution,
//! state updates and routing decisions.

use std::fmt::Debug;

pub fn log_node_start(node_id: &str, step: usize) {
    tracing::debug!(node_id = node_id, step, "Starting node execution");
}

/// Logs the state a node is about to read.
pub fn log_node_state<S: Debug>(node_id: &str, state: &S) {
    tracing::trace!(node_id = node_id, state = ?state, "Node execution: state");
}

pub fn log_node_complete<U: Debug>(node_id: &str, update: &U) {
    tracing::debug!(node_id = node_id, update = ?update, "Node execution complete");
}

pub fn log_state_update(node_id: &str) {
    tracing::debug!(node_id = node_id, "State updated");
}

pub fn log_routing(from: &str, to: &str, conditional: bool) {
    if conditional {
        tracing::debug!(from = %from, to = %to, "conditional routing");
    } else {
        tracing::trace!(from = %from, to = %to, "edge");
    }
}

/// Log graph execution start.
pub fn log_graph_start(entry: &str) {
    tracing::info!(entry = entry, "Starting graph execution");
}

/// Log graph execution completion.
pub fn log_graph_complete(steps: usize) {
    tracing::info!(steps, "Graph execution complete");
}

/// Log a streamed run stopping because its consumer went away.
pub fn log_stream_closed(node_id: &str, steps: usize) {
    tracing::debug!(node_id = node_id, steps, "stream receiver dropped, stopping run");
}

/// Log graph execution error.
pub fn log_graph_error(error: &crate::error::AgentError) {
    tracing::error!(?error, "Graph execution error");
}
