//! Message types for the conversation state.
//!
//! Roles: System (prompt text built by nodes), User, Assistant (optionally carrying
//! tool-call requests) and Tool (one result per request, correlated by id).
//! Only [`AssistantMessage`] can carry tool calls, and every [`ToolMessage`] names
//! the request it answers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix every error-shaped content starts with; the LLM reads it as a cue to repair.
pub const ERROR_PREFIX: &str = "Error:";

/// A single tool invocation requested by the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name (e.g. `sql_db_schema`, `SubmitFinalAnswer`).
    pub name: String,
    /// Arguments as a JSON object.
    pub arguments: Value,
    /// Correlation id; the matching tool message carries the same value.
    pub id: String,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
            id: id.into(),
        }
    }

    /// String argument by key, if present.
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

/// Model reply: text content plus zero or more tool-call requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

/// Outcome tag of a tool message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    #[default]
    Success,
    Error,
}

/// Result of one tool-call request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMessage {
    pub content: String,
    pub tool_call_id: String,
    #[serde(default)]
    pub status: ToolStatus,
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// System prompt; only built by nodes for an LLM request, never stored by the caller.
    System(String),
    /// User input.
    User(String),
    /// Model reply.
    Assistant(AssistantMessage),
    /// Tool output, correlated with a prior request.
    Tool(ToolMessage),
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    /// Creates an assistant message without tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(AssistantMessage {
            content: content.into(),
            tool_calls: Vec::new(),
        })
    }

    /// Creates an assistant message carrying tool-call requests.
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant(AssistantMessage {
            content: content.into(),
            tool_calls,
        })
    }

    /// Creates a successful tool result.
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self::Tool(ToolMessage {
            content: content.into(),
            tool_call_id: tool_call_id.into(),
            status: ToolStatus::Success,
        })
    }

    /// Creates an error tool result.
    pub fn tool_error(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self::Tool(ToolMessage {
            content: content.into(),
            tool_call_id: tool_call_id.into(),
            status: ToolStatus::Error,
        })
    }

    /// Role name as used in logs and error messages.
    pub fn role(&self) -> &'static str {
        match self {
            Message::System(_) => "system",
            Message::User(_) => "user",
            Message::Assistant(_) => "assistant",
            Message::Tool(_) => "tool",
        }
    }

    /// Text content of the message, whatever the role.
    pub fn content(&self) -> &str {
        match self {
            Message::System(c) | Message::User(c) => c,
            Message::Assistant(a) => &a.content,
            Message::Tool(t) => &t.content,
        }
    }

    /// Tool calls requested by this message; empty for anything but an assistant reply.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant(a) => &a.tool_calls,
            _ => &[],
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }

    /// Whether this message reports a failure.
    ///
    /// Tool messages answer through their status tag. Other messages have no tag and
    /// fall back to the `"Error:"` content prefix, which is how a model echoes a failure.
    pub fn signals_error(&self) -> bool {
        match self {
            Message::Tool(t) => t.status == ToolStatus::Error,
            other => other.content().starts_with(ERROR_PREFIX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: constructors produce the correct variant with content.
    #[test]
    fn message_constructors() {
        assert!(matches!(Message::system("s"), Message::System(c) if c == "s"));
        assert!(matches!(Message::user("u"), Message::User(c) if c == "u"));
        let ast = Message::assistant("a");
        assert_eq!(ast.content(), "a");
        assert!(!ast.has_tool_calls());
        let tool = Message::tool("42", "call_1");
        assert!(matches!(&tool, Message::Tool(t) if t.tool_call_id == "call_1" && t.status == ToolStatus::Success));
    }

    /// **Scenario**: only assistant messages expose tool calls.
    #[test]
    fn tool_calls_only_on_assistant() {
        let tc = ToolCall::new("sql_db_schema", json!({"table_names": "customers"}), "c1");
        let m = Message::assistant_with_tool_calls("", vec![tc.clone()]);
        assert_eq!(m.tool_calls(), &[tc]);
        assert!(Message::user("Error: x").tool_calls().is_empty());
        assert!(Message::tool("x", "c1").tool_calls().is_empty());
    }

    /// **Scenario**: tool messages signal errors by status, others by the "Error:" prefix.
    #[test]
    fn signals_error_uses_status_for_tool_messages() {
        assert!(Message::tool_error("anything", "c").signals_error());
        assert!(!Message::tool("Error: looks bad but succeeded", "c").signals_error());
        assert!(Message::assistant("Error: bad query").signals_error());
        assert!(!Message::assistant("SELECT 1").signals_error());
        assert!(!Message::assistant(" Error: leading space").signals_error());
    }

    /// **Scenario**: a tool message without status deserializes as success.
    #[test]
    fn tool_status_defaults_to_success() {
        let m: Message =
            serde_json::from_value(json!({"Tool": {"content": "ok", "tool_call_id": "x"}}))
                .expect("deserialize");
        assert!(!m.signals_error());
    }

    #[test]
    fn str_arg_reads_string_arguments() {
        let tc = ToolCall::new("db_query_tool", json!({"query": "SELECT 1", "n": 3}), "c");
        assert_eq!(tc.str_arg("query"), Some("SELECT 1"));
        assert_eq!(tc.str_arg("n"), None);
        assert_eq!(tc.str_arg("missing"), None);
    }
}
