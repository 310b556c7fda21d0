//! Tool node: execute the tool calls of the last assistant message.
//!
//! Used for `list_tables_tool`, `get_schema_tool` and `execute_query`, each bound to
//! its own tool. A call to any other name is not executed and gets an error tool
//! message. Data-shaped failures pass through as error-status tool messages. A raised
//! `ToolSourceError` triggers the fallback: results collected so far are discarded and
//! every request gets one error tool message, so each call id stays answered and the
//! run goes on.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use crate::error::AgentError;
use crate::graph::Node;
use crate::message::{Message, ToolCall};
use crate::prompts::SqlPrompts;
use crate::state::{SqlAgentState, StateUpdate};
use crate::tool_source::{ToolSource, ToolSourceError};

/// Truncates a string for logging, appending "..." if longer than max_len.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

/// Runs the tool calls of the last message against a [`ToolSource`], restricted to
/// the tool names the node is bound to.
pub struct ToolNode {
    id: String,
    tools: Arc<dyn ToolSource>,
    allowed: Vec<String>,
    prompts: Arc<SqlPrompts>,
}

impl ToolNode {
    pub fn new(
        id: impl Into<String>,
        tools: Arc<dyn ToolSource>,
        allowed: &[&str],
        prompts: Arc<SqlPrompts>,
    ) -> Self {
        Self {
            id: id.into(),
            tools,
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
            prompts,
        }
    }

    fn is_allowed(&self, name: &str) -> bool {
        self.allowed.iter().any(|a| a == name)
    }

    fn invalid_tool(&self, tc: &ToolCall) -> Message {
        Message::tool_error(
            format!(
                "Error: {} is not a valid tool, try one of [{}].",
                tc.name,
                self.allowed.join(", ")
            ),
            tc.id.clone(),
        )
    }

    fn fallback(&self, calls: &[ToolCall], error: &ToolSourceError) -> Vec<Message> {
        let content = self.prompts.tool_error(&error.to_string());
        calls
            .iter()
            .map(|tc| Message::tool_error(content.clone(), tc.id.clone()))
            .collect()
    }

    async fn call_all(&self, calls: &[ToolCall]) -> Result<Vec<Message>, ToolSourceError> {
        let mut results = Vec::with_capacity(calls.len());
        for tc in calls {
            if !self.is_allowed(&tc.name) {
                warn!(node = %self.id, tool = %tc.name, id = %tc.id, "tool not bound to node");
                results.push(self.invalid_tool(tc));
                continue;
            }
            debug!(node = %self.id, tool = %tc.name, id = %tc.id, "calling tool");
            let content = self.tools.call_tool(&tc.name, tc.arguments.clone()).await?;
            trace!(
                tool = %tc.name,
                is_error = content.is_error,
                result_preview = %truncate_for_log(&content.text, 200),
                "tool returned"
            );
            results.push(if content.is_error {
                Message::tool_error(content.text, tc.id.clone())
            } else {
                Message::tool(content.text, tc.id.clone())
            });
        }
        Ok(results)
    }
}

#[async_trait]
impl Node<SqlAgentState> for ToolNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, state: &SqlAgentState) -> Result<StateUpdate, AgentError> {
        let calls = match state.last_message() {
            Some(Message::Assistant(a)) => &a.tool_calls,
            Some(other) => {
                return Err(AgentError::InvalidState(format!(
                    "{} expects an assistant message last, found {}",
                    self.id,
                    other.role()
                )))
            }
            None => {
                return Err(AgentError::InvalidState(format!(
                    "{} ran on an empty conversation",
                    self.id
                )))
            }
        };
        if calls.is_empty() {
            warn!(node = %self.id, "assistant message carries no tool calls");
            return Ok(StateUpdate::Append(Vec::new()));
        }

        let messages = match self.call_all(calls).await {
            Ok(results) => results,
            Err(e) => {
                warn!(
                    node = %self.id,
                    error = %e,
                    calls = calls.len(),
                    "tool call failed, answering every request with an error"
                );
                self.fallback(calls, &e)
            }
        };
        Ok(StateUpdate::Append(messages))
    }
}
