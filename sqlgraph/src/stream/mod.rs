//! Streaming types for graph runs.
//!
//! `CompiledStateGraph::stream` spawns the run and forwards one event per node
//! boundary through a bounded channel. Consumers usually filter by `node_id`,
//! e.g. to print only what `give_final_answer` produced.

/// Event emitted while a graph runs.
#[derive(Debug, Clone)]
pub enum StreamEvent<S> {
    /// A node is about to run.
    TaskStart { node_id: String },
    /// A node finished and its update was merged; `state` is the merged state.
    Updates { node_id: String, state: S },
    /// The run aborted; no further events follow.
    Error(String),
}

impl<S> StreamEvent<S> {
    /// Node id the event belongs to, if any.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            StreamEvent::TaskStart { node_id } | StreamEvent::Updates { node_id, .. } => {
                Some(node_id)
            }
            StreamEvent::Error(_) => None,
        }
    }
}
