//! Query generation: the loop head of the graph.
//!
//! The LLM sees the schema in its system prompt plus the whole conversation and may
//! only call `SubmitFinalAnswer`. A plain-text reply is a candidate query for
//! `correct_query`; a `SubmitFinalAnswer` call ends the loop. Calls to any other tool
//! are protocol violations and get an error tool message each, so the next pass can
//! see what went wrong.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::error::AgentError;
use crate::graph::Node;
use crate::llm::{LlmClient, ToolBinding};
use crate::message::{Message, ToolCall};
use crate::prompts::SqlPrompts;
use crate::state::{SqlAgentState, StateUpdate};
use crate::tool_source::{tool_spec, TOOL_DB_QUERY};

use super::{FINAL_ANSWER_ARG, GENERATE_QUERY, SUBMIT_FINAL_ANSWER};

/// Default number of `generate_query` executions before the policy kicks in.
pub const DEFAULT_MAX_QUERY_ATTEMPTS: u32 = 8;

/// Correlation id of a final-answer call synthesized at the iteration limit.
pub const ITERATION_LIMIT_CALL_ID: &str = "iteration_limit";

/// What `generate_query` does once `query_attempts` reaches the cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IterationLimitPolicy {
    /// Submit the latest successful query result (or a fallback note) as the final answer.
    #[default]
    BestEffort,
    /// Abort the run with `AgentError::IterationLimit`.
    Fail,
}

impl std::str::FromStr for IterationLimitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "best_effort" => Ok(Self::BestEffort),
            "fail" => Ok(Self::Fail),
            _ => Err(format!(
                "unknown iteration policy: {} (use best_effort or fail)",
                s
            )),
        }
    }
}

/// LLM bound to `SubmitFinalAnswer` with the schema in the system prompt.
pub struct GenerateQueryNode {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<SqlPrompts>,
    table_info: String,
    max_attempts: u32,
    policy: IterationLimitPolicy,
}

impl GenerateQueryNode {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<SqlPrompts>,
        table_info: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            prompts,
            table_info: table_info.into(),
            max_attempts: DEFAULT_MAX_QUERY_ATTEMPTS,
            policy: IterationLimitPolicy::default(),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_policy(mut self, policy: IterationLimitPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn at_limit(&self, state: &SqlAgentState) -> Result<StateUpdate, AgentError> {
        match self.policy {
            IterationLimitPolicy::Fail => Err(AgentError::IterationLimit(state.query_attempts)),
            IterationLimitPolicy::BestEffort => {
                let answer = state
                    .last_tool_output_of(TOOL_DB_QUERY)
                    .unwrap_or(self.prompts.no_answer_fallback.as_str());
                warn!(
                    attempts = state.query_attempts,
                    "query attempts exhausted, submitting best-effort answer"
                );
                let call = ToolCall::new(
                    SUBMIT_FINAL_ANSWER,
                    json!({ FINAL_ANSWER_ARG: answer }),
                    ITERATION_LIMIT_CALL_ID,
                );
                Ok(StateUpdate::QueryGenerated(vec![
                    Message::assistant_with_tool_calls("", vec![call]),
                ]))
            }
        }
    }
}

#[async_trait]
impl Node<SqlAgentState> for GenerateQueryNode {
    fn id(&self) -> &str {
        GENERATE_QUERY
    }

    async fn run(&self, state: &SqlAgentState) -> Result<StateUpdate, AgentError> {
        if state.query_attempts >= self.max_attempts {
            return self.at_limit(state);
        }

        let mut request = Vec::with_capacity(state.messages.len() + 1);
        request.push(Message::system(self.prompts.query_generator(&self.table_info)));
        request.extend(state.messages.iter().cloned());

        let spec = tool_spec(SUBMIT_FINAL_ANSWER)
            .map_err(|e| AgentError::ExecutionFailed(e.to_string()))?;
        let response = self
            .llm
            .invoke_with_tools(&request, &ToolBinding::new(vec![spec]))
            .await?;

        let message = response.into_message();
        let violations: Vec<Message> = message
            .tool_calls()
            .iter()
            .filter(|tc| tc.name != SUBMIT_FINAL_ANSWER)
            .map(|tc| {
                warn!(tool = %tc.name, id = %tc.id, "wrong tool called during query generation");
                Message::tool_error(self.prompts.wrong_tool(&tc.name), tc.id.clone())
            })
            .collect();

        let mut messages = Vec::with_capacity(1 + violations.len());
        messages.push(message);
        messages.extend(violations);
        Ok(StateUpdate::QueryGenerated(messages))
    }
}
