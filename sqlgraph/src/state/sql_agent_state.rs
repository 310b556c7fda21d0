//! Conversation state for the SQL agent graph and its tagged updates.
//!
//! Nodes read `SqlAgentState` by reference and return a `StateUpdate`; the graph
//! merges it with `SqlAgentState::apply`. Messages are append-only; `question` is
//! written once by the entry node; `query_attempts` counts `generate_query` runs.

use serde::{Deserialize, Serialize};

use crate::graph::GraphState;
use crate::message::{Message, ToolCall};

/// State threaded through every node of one run.
///
/// **Interaction**: seeded by `SqlAgentState::from_history`, passed through
/// `CompiledStateGraph::invoke`, discarded after the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlAgentState {
    /// Chat history followed by everything nodes produced in this run.
    pub messages: Vec<Message>,
    /// The user question, captured from the last user message at entry.
    #[serde(default)]
    pub question: Option<String>,
    /// Number of `generate_query` executions so far.
    #[serde(default)]
    pub query_attempts: u32,
}

/// Partial update returned by a node. Each variant names the fields it writes.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    /// Writes `messages` (append) and `question` (replace).
    Seed {
        messages: Vec<Message>,
        question: String,
    },
    /// Writes `messages` (append).
    Append(Vec<Message>),
    /// Writes `messages` (append) and `query_attempts` (+1).
    QueryGenerated(Vec<Message>),
}

impl StateUpdate {
    /// Messages this update appends.
    pub fn messages(&self) -> &[Message] {
        match self {
            StateUpdate::Seed { messages, .. }
            | StateUpdate::Append(messages)
            | StateUpdate::QueryGenerated(messages) => messages,
        }
    }
}

impl GraphState for SqlAgentState {
    type Update = StateUpdate;

    fn apply(&mut self, update: StateUpdate) {
        match update {
            StateUpdate::Seed { messages, question } => {
                self.messages.extend(messages);
                self.question = Some(question);
            }
            StateUpdate::Append(messages) => self.messages.extend(messages),
            StateUpdate::QueryGenerated(messages) => {
                self.messages.extend(messages);
                self.query_attempts += 1;
            }
        }
    }
}

impl SqlAgentState {
    /// Fresh state for one user turn, seeded with the visible chat history.
    pub fn from_history(history: impl IntoIterator<Item = Message>) -> Self {
        Self {
            messages: history.into_iter().collect(),
            question: None,
            query_attempts: 0,
        }
    }

    /// The message that drives routing.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Content of the most recent user message, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::User(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Last tool call of the last message (where `SubmitFinalAnswer` sits).
    pub fn last_tool_call(&self) -> Option<&ToolCall> {
        self.last_message().and_then(|m| m.tool_calls().last())
    }

    /// Content of the chronologically last assistant message without tool calls.
    pub fn last_assistant_reply(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant(a) if a.tool_calls.is_empty() => Some(a.content.as_str()),
            _ => None,
        })
    }

    /// The call a tool result answers: the nearest earlier call with its id.
    fn call_answered_by(&self, index: usize, tool_call_id: &str) -> Option<&ToolCall> {
        self.messages[..index]
            .iter()
            .rev()
            .flat_map(|m| m.tool_calls())
            .find(|tc| tc.id == tool_call_id)
    }

    /// Content of the most recent successful result of a `tool_name` call, if any.
    pub fn last_tool_output_of(&self, tool_name: &str) -> Option<&str> {
        self.messages
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, m)| match m {
                Message::Tool(t) if !m.signals_error() => self
                    .call_answered_by(i, &t.tool_call_id)
                    .filter(|tc| tc.name == tool_name)
                    .map(|_| t.content.as_str()),
                _ => None,
            })
    }
}
