//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Works against any OpenAI-compatible endpoint (OpenAI, Groq, Ollama) through a
//! custom base URL. Tools are bound per call from the node's [`ToolBinding`].
//!
//! Assistant messages with tool calls and tool results are sent in the wire shape
//! the API expects, so the model sees the full request/result history.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse, LlmUsage, ToolBinding};
use crate::message::{Message, ToolCall};

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionMessageToolCalls, ChatCompletionRequestMessage, ChatCompletionTool,
        ChatCompletionToolChoiceOption, ChatCompletionTools, CreateChatCompletionRequestArgs,
        FunctionObject, ToolChoiceOptions,
    },
    Client,
};

use super::ToolChoiceMode;

/// OpenAI Chat Completions client.
///
/// Uses `OPENAI_API_KEY` from the environment by default; or provide config via
/// `ChatOpenAI::with_config`.
///
/// **Interaction**: Implements `LlmClient`; shared by every LLM-driven node.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            temperature: None,
        }
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
        }
    }

    /// Build client from optional key and base URL, falling back to the env defaults.
    pub fn from_parts(
        model: impl Into<String>,
        api_key: Option<&str>,
        api_base: Option<&str>,
    ) -> Self {
        let mut config = OpenAIConfig::new();
        if let Some(key) = api_key {
            config = config.with_api_key(key);
        }
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }
        Self::with_config(config, model)
    }

    /// Set temperature (0–2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Wire JSON for one message.
    fn message_to_json(message: &Message) -> Value {
        match message {
            Message::System(s) => json!({"role": "system", "content": s}),
            Message::User(s) => json!({"role": "user", "content": s}),
            Message::Assistant(a) => {
                if a.tool_calls.is_empty() {
                    json!({"role": "assistant", "content": a.content})
                } else {
                    let calls: Value = a
                        .tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "id": tc.id,
                                "type": "function",
                                "function": {
                                    "name": tc.name,
                                    "arguments": tc.arguments.to_string(),
                                },
                            })
                        })
                        .collect();
                    let content = if a.content.is_empty() {
                        Value::Null
                    } else {
                        Value::String(a.content.clone())
                    };
                    json!({"role": "assistant", "content": content, "tool_calls": calls})
                }
            }
            Message::Tool(t) => json!({
                "role": "tool",
                "content": t.content,
                "tool_call_id": t.tool_call_id,
            }),
        }
    }

    /// Convert our `Message` list to OpenAI request messages.
    fn messages_to_request(
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, AgentError> {
        messages
            .iter()
            .map(|m| {
                serde_json::from_value(Self::message_to_json(m)).map_err(|e| {
                    AgentError::ExecutionFailed(format!("OpenAI message conversion failed: {}", e))
                })
            })
            .collect()
    }

    /// Arguments arrive as a JSON string; an empty string means no arguments.
    /// Unparseable text is kept as a JSON string so the tool layer can report it.
    fn parse_arguments(raw: &str) -> Value {
        if raw.trim().is_empty() {
            return json!({});
        }
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        binding: &ToolBinding,
    ) -> Result<LlmResponse, AgentError> {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::messages_to_request(messages)?);

        if !binding.tools.is_empty() {
            let chat_tools: Vec<ChatCompletionTools> = binding
                .tools
                .iter()
                .map(|t| {
                    ChatCompletionTools::Function(ChatCompletionTool {
                        function: FunctionObject {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: Some(t.input_schema.clone()),
                            ..Default::default()
                        },
                    })
                })
                .collect();
            args.tools(chat_tools);

            if let Some(mode) = binding.tool_choice {
                let opt = match mode {
                    ToolChoiceMode::Auto => ToolChoiceOptions::Auto,
                    ToolChoiceMode::None => ToolChoiceOptions::None,
                    ToolChoiceMode::Required => ToolChoiceOptions::Required,
                };
                args.tool_choice(ChatCompletionToolChoiceOption::Mode(opt));
            }
        }

        if let Some(t) = self.temperature {
            args.temperature(t);
        }

        let request = args.build().map_err(|e| {
            AgentError::ExecutionFailed(format!("OpenAI request build failed: {}", e))
        })?;

        debug!(
            trace_id = %trace_id,
            model = %self.model,
            message_count = messages.len(),
            tools = ?binding.tool_names(),
            temperature = ?self.temperature,
            tool_choice = ?binding.tool_choice,
            "OpenAI chat create"
        );
        if let Ok(js) = serde_json::to_string_pretty(&request) {
            trace!(trace_id = %trace_id, request = %js, "OpenAI request body");
        }

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::ExecutionFailed(format!("OpenAI API error: {}", e)))?;

        if let Ok(js) = serde_json::to_string_pretty(&response) {
            trace!(trace_id = %trace_id, response = %js, "OpenAI response body");
        }

        let choice =
            response.choices.into_iter().next().ok_or_else(|| {
                AgentError::ExecutionFailed("OpenAI returned no choices".to_string())
            })?;

        let msg = choice.message;
        let content = msg.content.unwrap_or_default();
        let tool_calls: Vec<ToolCall> = msg
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tc| {
                if let ChatCompletionMessageToolCalls::Function(f) = tc {
                    Some(ToolCall {
                        arguments: Self::parse_arguments(&f.function.arguments),
                        name: f.function.name,
                        id: f.id,
                    })
                } else {
                    None
                }
            })
            .collect();

        let usage = response.usage.map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        debug!(
            trace_id = %trace_id,
            content_len = content.len(),
            tool_calls = tool_calls.len(),
            "OpenAI chat response"
        );
        Ok(LlmResponse {
            content,
            tool_calls,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: every message kind converts to a request message the API types accept.
    #[test]
    fn messages_to_request_accepts_all_roles() {
        let call = ToolCall::new("sql_db_list_tables", json!({}), "tool_xyz123");
        let messages = vec![
            Message::system("sys"),
            Message::user("How many customers are there?"),
            Message::assistant_with_tool_calls("", vec![call]),
            Message::tool("customers", "tool_xyz123"),
            Message::assistant("SELECT COUNT(*) FROM customers;"),
        ];
        let request = ChatOpenAI::messages_to_request(&messages).expect("converts");
        assert_eq!(request.len(), 5);
        assert!(matches!(request[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(request[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(request[3], ChatCompletionRequestMessage::Tool(_)));
    }

    #[test]
    fn assistant_tool_calls_serialize_arguments_as_string() {
        let call = ToolCall::new("db_query_tool", json!({"query": "SELECT 1"}), "c1");
        let js = ChatOpenAI::message_to_json(&Message::assistant_with_tool_calls("", vec![call]));
        assert_eq!(js["content"], Value::Null);
        assert_eq!(js["tool_calls"][0]["id"], "c1");
        let args = js["tool_calls"][0]["function"]["arguments"]
            .as_str()
            .expect("string arguments");
        assert_eq!(
            serde_json::from_str::<Value>(args).unwrap(),
            json!({"query": "SELECT 1"})
        );
    }

    #[test]
    fn parse_arguments_handles_empty_and_invalid() {
        assert_eq!(ChatOpenAI::parse_arguments(""), json!({}));
        assert_eq!(
            ChatOpenAI::parse_arguments("{\"query\":\"SELECT 1\"}"),
            json!({"query": "SELECT 1"})
        );
        assert_eq!(ChatOpenAI::parse_arguments("not json"), json!("not json"));
    }

    #[test]
    fn from_parts_keeps_model() {
        let llm = ChatOpenAI::from_parts(
            "gpt-4o-mini",
            Some("sk-test"),
            Some("http://localhost:11434/v1"),
        )
        .with_temperature(0.0);
        assert_eq!(llm.model(), "gpt-4o-mini");
        assert_eq!(llm.temperature, Some(0.0));
    }
}
