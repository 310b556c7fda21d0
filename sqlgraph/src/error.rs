//! Agent execution error types.
//!
//! Returned by `Node::run` and by `CompiledStateGraph::invoke`. Recoverable tool
//! failures never surface here: they are turned into error tool messages by the
//! tool layer. What remains is unrecoverable for the current run.

use thiserror::Error;

/// Agent execution error.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM call failed, router returned an unknown key).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// State did not have the shape a node requires (e.g. no question, no final-answer call).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// `generate_query` ran out of attempts under `IterationLimitPolicy::Fail`.
    #[error("query generation did not converge after {0} attempts")]
    IterationLimit(u32),

    /// The graph executed more node steps than its recursion limit allows.
    #[error("recursion limit of {0} steps reached without hitting END")]
    RecursionLimit(usize),
}
