//! LLM client abstraction for the SQL agent nodes.
//!
//! Every LLM-driven node sends a message list plus a [`ToolBinding`] (the tools
//! the model may call and whether it must call one) and gets back assistant text
//! and optional tool calls. This module defines the trait, the OpenAI-compatible
//! client and a scripted mock.

mod mock;
mod openai;

pub use mock::{MockLlm, RecordedCall};
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::{Message, ToolCall};
use crate::tool_source::ToolSpec;

/// Tool choice mode for chat completions: when tools are present, controls whether
/// the model may choose (auto), must not use (none), or must use (required).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    /// Model can pick between message or tool calls. Default when tools are present.
    #[default]
    Auto,
    /// Model will not call any tool.
    None,
    /// Model must call one or more tools.
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            _ => Err(format!(
                "unknown tool_choice: {} (use auto, none, or required)",
                s
            )),
        }
    }
}

/// Tools offered to the model for one call, and how strongly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolBinding {
    pub tools: Vec<ToolSpec>,
    /// `None` leaves the provider default (auto when tools are present).
    pub tool_choice: Option<ToolChoiceMode>,
}

impl ToolBinding {
    /// No tools: plain completion.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(tools: Vec<ToolSpec>) -> Self {
        Self {
            tools,
            tool_choice: None,
        }
    }

    pub fn with_tool_choice(mut self, mode: ToolChoiceMode) -> Self {
        self.tool_choice = Some(mode);
        self
    }

    /// Names of the bound tools, in order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from an LLM completion: assistant message text and optional tool calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Tool calls from this turn.
    pub tool_calls: Vec<ToolCall>,
    /// Token usage for this call, when the provider returns it.
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    /// Plain text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Reply carrying tool calls.
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            usage: None,
        }
    }

    /// Assistant message as it is appended to the conversation.
    pub fn into_message(self) -> Message {
        Message::assistant_with_tool_calls(self.content, self.tool_calls)
    }
}

/// LLM client: given messages and a tool binding, returns assistant text and tool calls.
///
/// Implementations: `MockLlm` (scripted), `ChatOpenAI` (OpenAI-compatible API).
///
/// **Interaction**: Used by `get_schema`, `generate_query`, `correct_query` and
/// `give_final_answer`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One completion with the given tools bound.
    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        binding: &ToolBinding,
    ) -> Result<LlmResponse, AgentError>;

    /// One completion without tools.
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.invoke_with_tools(messages, &ToolBinding::none()).await
    }
}
