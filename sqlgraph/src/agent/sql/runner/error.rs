//! Error type for [`SqlAgentRunner`](super::SqlAgentRunner).

use std::time::Duration;

use crate::db::DatabaseError;
use crate::error::AgentError;
use crate::graph::CompilationError;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("compilation failed: {0}")]
    Compilation(#[from] CompilationError),
    #[error("execution failed: {0}")]
    Execution(#[from] AgentError),
    /// Reading the schema at run start failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("run timed out after {0:?}")]
    Timeout(Duration),
    /// The graph reached END but its last message is not a plain assistant reply.
    #[error("run finished without an answer")]
    NoAnswer,
}
