//! State merge semantics for graph execution.
//!
//! Nodes never return a full state. They return a typed partial update
//! (`GraphState::Update`) and the run loop merges it with the state's own
//! `apply`, so every node's write set is visible in the update type.
//!
//! ```rust
//! use sqlgraph::graph::GraphState;
//!
//! #[derive(Clone, Debug, Default)]
//! struct Log {
//!     lines: Vec<String>,
//!     last: Option<String>,
//! }
//!
//! #[derive(Debug)]
//! enum LogUpdate {
//!     Push(String),
//! }
//!
//! impl GraphState for Log {
//!     type Update = LogUpdate;
//!
//!     fn apply(&mut self, update: LogUpdate) {
//!         match update {
//!             LogUpdate::Push(line) => {
//!                 self.last = Some(line.clone());
//!                 self.lines.push(line);
//!             }
//!         }
//!     }
//! }
//! ```

use std::fmt::Debug;

/// State that flows through a [`StateGraph`](super::StateGraph).
///
/// `apply` is the single reducer: the run loop calls it once per executed node,
/// in execution order.
pub trait GraphState: Clone + Send + Sync + Debug + 'static {
    /// Partial update returned by a node.
    type Update: Send + Debug;

    /// Merges one node's update into `self`.
    fn apply(&mut self, update: Self::Update);
}
