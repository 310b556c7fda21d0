//! Tool source abstraction: list tools and call a tool.
//!
//! Nodes depend on `ToolSource` instead of a concrete database; implementations
//! are `SqlDatabaseToolSource` (the three SQL tools over a [`SqliteDatabase`](crate::db::SqliteDatabase))
//! and `MockToolSource` (tests).
//!
//! Two kinds of failure exist. A *data-shaped* error is a normal result whose
//! `ToolCallContent::is_error` is set (bad SQL, empty result, unknown table): the
//! model reads it and repairs. A raised `ToolSourceError` (unknown tool, bad
//! arguments, closed database) is caught by the `ToolNode` fallback, which
//! answers every outstanding request with an error message.

mod mock;
mod sql_database_tool_source;
mod yaml_specs;

pub use mock::MockToolSource;
pub use sql_database_tool_source::{
    SqlDatabaseToolSource, TOOL_DB_QUERY, TOOL_SQL_DB_LIST_TABLES, TOOL_SQL_DB_SCHEMA,
};
pub use yaml_specs::{load_tool_specs, tool_spec, YamlSpecError};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::db::DatabaseError;

/// Tool specification: name, description and JSON Schema for arguments.
///
/// Deserializes from the YAML files under `sqlgraph/tools/`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    pub name: String,
    /// Human-readable description for the LLM.
    pub description: Option<String>,
    /// JSON Schema for arguments.
    pub input_schema: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        }
    }
}

/// Result of a single tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallContent {
    pub text: String,
    /// Data-shaped error: the call ran but its answer is a failure report.
    pub is_error: bool,
}

impl ToolCallContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Errors raised from listing or calling tools.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<DatabaseError> for ToolSourceError {
    fn from(e: DatabaseError) -> Self {
        ToolSourceError::Database(e.to_string())
    }
}

/// Tool source: list tools and call a tool.
///
/// **Interaction**: `list_tools` feeds `ToolBinding`s for LLM nodes; `call_tool` is
/// used by `ToolNode`.
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// List available tools.
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    /// Call a tool by name with JSON arguments.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError>;
}
