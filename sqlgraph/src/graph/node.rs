//! Graph node trait: one step in a StateGraph.
//!
//! Receives a borrowed state, returns a partial update. Routing is not a node
//! concern: fixed edges and conditional routers decide what runs next.

use async_trait::async_trait;

use crate::error::AgentError;

use super::GraphState;

/// One step in a graph: state in, update out.
///
/// **Interaction**: registered via `StateGraph::add_node`; called by the
/// `CompiledStateGraph` run loop, which merges the update with `GraphState::apply`.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: GraphState,
{
    /// Node id (e.g. `"generate_query"`). Must be unique within a graph.
    fn id(&self) -> &str;

    /// One step. An `Err` aborts the run; there is no retry.
    async fn run(&self, state: &S) -> Result<S::Update, AgentError>;
}
