//! Mock LLM for tests and offline runs.
//!
//! Replays a script of responses in order, one per call, across every node that
//! shares it. Each call is recorded (messages + tool binding) so tests can assert
//! what a node actually sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse, ToolBinding};
use crate::message::{Message, ToolCall};

/// One recorded request.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub binding: ToolBinding,
}

/// Mock LLM: scripted responses, or one fixed response repeated.
///
/// **Interaction**: Implements `LlmClient`; shared by all nodes of a graph via `Arc`.
pub struct MockLlm {
    script: Mutex<VecDeque<LlmResponse>>,
    /// Returned once the script is empty; `None` makes an exhausted script an error.
    fallback: Option<LlmResponse>,
    /// When set, every call fails with this message.
    failure: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlm {
    /// Creates a mock that always returns the same content and tool calls.
    pub fn new(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(LlmResponse::with_tool_calls(content, tool_calls)),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock that returns assistant text and no tool_calls.
    pub fn with_no_tool_calls(content: impl Into<String>) -> Self {
        Self::new(content, vec![])
    }

    /// Creates a mock that replays `responses` in order and errors when they run out.
    pub fn scripted(responses: impl IntoIterator<Item = LlmResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            fallback: None,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock whose every call fails (transport error stand-in).
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            failure: Some(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Appends one response to the script.
    pub fn push_response(&self, response: LlmResponse) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(response);
        }
    }

    /// Snapshot of every call made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Responses still queued.
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        binding: &ToolBinding,
    ) -> Result<LlmResponse, AgentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                binding: binding.clone(),
            });
        }
        if let Some(ref message) = self.failure {
            return Err(AgentError::ExecutionFailed(message.clone()));
        }
        let next = self
            .script
            .lock()
            .map_err(|_| AgentError::ExecutionFailed("mock llm script poisoned".into()))?
            .pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| AgentError::ExecutionFailed("mock llm script exhausted".into()))
    }
}
