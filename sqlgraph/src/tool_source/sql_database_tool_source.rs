//! SQL tools over a SQLite handle: list tables, describe tables, run a query.
//!
//! SQL mistakes are answered as data-shaped errors so the model can repair them.
//! Only structural problems (unknown tool, missing argument, closed handle) are raised.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::db::{DatabaseError, SqliteDatabase};
use crate::tool_source::{tool_spec, ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

pub const TOOL_SQL_DB_LIST_TABLES: &str = "sql_db_list_tables";
pub const TOOL_SQL_DB_SCHEMA: &str = "sql_db_schema";
pub const TOOL_DB_QUERY: &str = "db_query_tool";

/// Answer for a query that ran but returned nothing.
pub(crate) const EMPTY_QUERY_RESULT: &str =
    "Error: Query failed. Please rewrite your query and try again.";

fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ToolSourceError> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolSourceError::InvalidInput(format!("missing string argument `{}`", key)))
}

/// Data-shaped for SQL-level failures, raised for anything about the handle itself.
fn classify(e: DatabaseError) -> Result<ToolCallContent, ToolSourceError> {
    match e {
        DatabaseError::Sqlite(_) | DatabaseError::UnknownTables(_) => {
            Ok(ToolCallContent::error(format!("Error: {}", e)))
        }
        other => Err(other.into()),
    }
}

/// The three SQL tools backed by one database handle.
///
/// **Interaction**: Wrapped by `ToolNode` for the `list_tables_tool`,
/// `get_schema_tool` and `execute_query` nodes.
pub struct SqlDatabaseToolSource {
    db: Arc<SqliteDatabase>,
}

impl SqlDatabaseToolSource {
    pub fn new(db: Arc<SqliteDatabase>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<SqliteDatabase> {
        &self.db
    }

    async fn list_tables(&self) -> Result<ToolCallContent, ToolSourceError> {
        let tables = self.db.list_tables().await?;
        Ok(ToolCallContent::text(tables.join(", ")))
    }

    async fn schema(&self, arguments: &Value) -> Result<ToolCallContent, ToolSourceError> {
        let names: Vec<String> = required_str(arguments, "table_names")?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if names.is_empty() {
            return Err(ToolSourceError::InvalidInput(
                "table_names is empty".to_string(),
            ));
        }
        match self.db.table_info(Some(&names)).await {
            Ok(info) => Ok(ToolCallContent::text(info)),
            Err(e) => classify(e),
        }
    }

    async fn query(&self, arguments: &Value) -> Result<ToolCallContent, ToolSourceError> {
        let query = required_str(arguments, "query")?;
        match self.db.run(query).await {
            Ok(out) if out.trim().is_empty() => Ok(ToolCallContent::error(EMPTY_QUERY_RESULT)),
            Ok(out) => Ok(ToolCallContent::text(out)),
            Err(e) => classify(e),
        }
    }
}

#[async_trait]
impl ToolSource for SqlDatabaseToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        [TOOL_SQL_DB_LIST_TABLES, TOOL_SQL_DB_SCHEMA, TOOL_DB_QUERY]
            .iter()
            .map(|name| tool_spec(name).map_err(|e| ToolSourceError::Transport(e.to_string())))
            .collect()
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        debug!(tool = name, arguments = %arguments, "sql tool call");
        match name {
            TOOL_SQL_DB_LIST_TABLES => self.list_tables().await,
            TOOL_SQL_DB_SCHEMA => self.schema(&arguments).await,
            TOOL_DB_QUERY => self.query(&arguments).await,
            other => Err(ToolSourceError::NotFound(other.to_string())),
        }
    }
}
