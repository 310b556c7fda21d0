//! Asks the LLM which tables it needs described.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::Node;
use crate::llm::{LlmClient, ToolBinding};
use crate::state::{SqlAgentState, StateUpdate};
use crate::tool_source::{tool_spec, TOOL_SQL_DB_SCHEMA};

use super::GET_SCHEMA;

/// LLM bound to `sql_db_schema`, given the full history.
pub struct GetSchemaNode {
    llm: Arc<dyn LlmClient>,
}

impl GetSchemaNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Node<SqlAgentState> for GetSchemaNode {
    fn id(&self) -> &str {
        GET_SCHEMA
    }

    async fn run(&self, state: &SqlAgentState) -> Result<StateUpdate, AgentError> {
        let spec = tool_spec(TOOL_SQL_DB_SCHEMA)
            .map_err(|e| AgentError::ExecutionFailed(e.to_string()))?;
        let response = self
            .llm
            .invoke_with_tools(&state.messages, &ToolBinding::new(vec![spec]))
            .await?;
        Ok(StateUpdate::Append(vec![response.into_message()]))
    }
}
