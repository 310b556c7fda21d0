//! Entry node: requests the table list without asking the LLM.

use async_trait::async_trait;
use serde_json::json;

use crate::error::AgentError;
use crate::graph::Node;
use crate::message::{Message, ToolCall};
use crate::state::{SqlAgentState, StateUpdate};
use crate::tool_source::TOOL_SQL_DB_LIST_TABLES;

use super::FIRST_TOOL_CALL;

/// Correlation id of the synthetic list-tables request.
pub const FIRST_TOOL_CALL_ID: &str = "tool_xyz123";

/// Emits a fixed `sql_db_list_tables` call and captures the question.
///
/// The question is the content of the last user message; a conversation without
/// one cannot be answered.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstToolCallNode;

#[async_trait]
impl Node<SqlAgentState> for FirstToolCallNode {
    fn id(&self) -> &str {
        FIRST_TOOL_CALL
    }

    async fn run(&self, state: &SqlAgentState) -> Result<StateUpdate, AgentError> {
        let question = state
            .last_user_message()
            .ok_or_else(|| AgentError::InvalidState("no user message to answer".into()))?;
        let call = ToolCall::new(TOOL_SQL_DB_LIST_TABLES, json!({}), FIRST_TOOL_CALL_ID);
        Ok(StateUpdate::Seed {
            messages: vec![Message::assistant_with_tool_calls("", vec![call])],
            question: question.to_string(),
        })
    }
}
