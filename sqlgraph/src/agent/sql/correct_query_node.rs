//! Double-checks a candidate query and turns it into a `db_query_tool` call.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::Node;
use crate::llm::{LlmClient, ToolBinding, ToolChoiceMode};
use crate::message::Message;
use crate::prompts::SqlPrompts;
use crate::state::{SqlAgentState, StateUpdate};
use crate::tool_source::{tool_spec, TOOL_DB_QUERY};

use super::CORRECT_QUERY;

/// LLM forced to call `db_query_tool`; sees the checker prompt and the last message only.
pub struct CorrectQueryNode {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<SqlPrompts>,
}

impl CorrectQueryNode {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<SqlPrompts>) -> Self {
        Self { llm, prompts }
    }
}

#[async_trait]
impl Node<SqlAgentState> for CorrectQueryNode {
    fn id(&self) -> &str {
        CORRECT_QUERY
    }

    async fn run(&self, state: &SqlAgentState) -> Result<StateUpdate, AgentError> {
        let last = state
            .last_message()
            .ok_or_else(|| AgentError::InvalidState("no candidate query to check".into()))?;
        let request = [
            Message::system(self.prompts.query_checker_system.clone()),
            last.clone(),
        ];
        let spec =
            tool_spec(TOOL_DB_QUERY).map_err(|e| AgentError::ExecutionFailed(e.to_string()))?;
        let binding = ToolBinding::new(vec![spec]).with_tool_choice(ToolChoiceMode::Required);
        let response = self.llm.invoke_with_tools(&request, &binding).await?;
        Ok(StateUpdate::Append(vec![response.into_message()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::message::ToolCall;
    use serde_json::json;

    /// **Scenario**: only the checker prompt and the last message are sent, and the
    /// query tool is required.
    #[tokio::test]
    async fn sends_checker_prompt_and_last_message_only() {
        let call = ToolCall::new("db_query_tool", json!({"query": "SELECT 1;"}), "q1");
        let llm = Arc::new(MockLlm::new("", vec![call.clone()]));
        let prompts = Arc::new(SqlPrompts::default());
        let node = CorrectQueryNode::new(llm.clone(), prompts.clone());
        let state = SqlAgentState::from_history(vec![
            Message::user("q"),
            Message::tool("customers", "t"),
            Message::assistant("SELECT 1"),
        ]);

        let update = node.run(&state).await.unwrap();
        assert_eq!(
            update,
            StateUpdate::Append(vec![Message::assistant_with_tool_calls("", vec![call])])
        );
        let sent = &llm.calls()[0];
        assert_eq!(
            sent.messages,
            vec![
                Message::system(prompts.query_checker_system.clone()),
                Message::assistant("SELECT 1"),
            ]
        );
        assert_eq!(sent.binding.tool_names(), vec!["db_query_tool"]);
        assert_eq!(sent.binding.tool_choice, Some(ToolChoiceMode::Required));
    }

    #[tokio::test]
    async fn llm_failure_propagates() {
        let node = CorrectQueryNode::new(
            Arc::new(MockLlm::failing("connection reset")),
            Arc::new(SqlPrompts::default()),
        );
        let state = SqlAgentState::from_history(vec![Message::assistant("SELECT 1")]);
        assert!(matches!(
            node.run(&state).await,
            Err(AgentError::ExecutionFailed(ref m)) if m == "connection reset"
        ));
    }
}
