//! Turns the submitted SQL result into a natural-language answer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::Node;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::SqlPrompts;
use crate::state::{SqlAgentState, StateUpdate};

use super::{FINAL_ANSWER_ARG, GIVE_FINAL_ANSWER, SUBMIT_FINAL_ANSWER};

/// LLM called with only the final-answer prompt; its reply is the run's output.
pub struct GiveFinalAnswerNode {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<SqlPrompts>,
}

impl GiveFinalAnswerNode {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<SqlPrompts>) -> Self {
        Self { llm, prompts }
    }
}

#[async_trait]
impl Node<SqlAgentState> for GiveFinalAnswerNode {
    fn id(&self) -> &str {
        GIVE_FINAL_ANSWER
    }

    async fn run(&self, state: &SqlAgentState) -> Result<StateUpdate, AgentError> {
        let question = state
            .question
            .as_deref()
            .ok_or_else(|| AgentError::InvalidState("question was never captured".into()))?;
        let call = state.last_tool_call().ok_or_else(|| {
            AgentError::InvalidState(format!("no {} call to answer from", SUBMIT_FINAL_ANSWER))
        })?;
        let sql_result = call.str_arg(FINAL_ANSWER_ARG).ok_or_else(|| {
            AgentError::InvalidState(format!(
                "{} call {} has no string `{}`",
                call.name, call.id, FINAL_ANSWER_ARG
            ))
        })?;

        let request = [Message::system(
            self.prompts.final_answer(question, sql_result),
        )];
        let response = self.llm.invoke(&request).await?;
        Ok(StateUpdate::Append(vec![Message::assistant(response.content)]))
    }
}
