//! Mock tool source for tests: fixed specs, a fixed reply or a forced failure.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool_source::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

enum Reply {
    Text(String),
    Fail(String),
}

/// Mock tool source.
///
/// Lists the given tool names. `call_tool` returns the fixed text for any listed
/// tool, fails for unlisted ones, and always fails when built with `failing`.
/// Calls are recorded.
pub struct MockToolSource {
    names: Vec<String>,
    reply: Reply,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockToolSource {
    pub fn new(names: &[&str], reply: impl Into<String>) -> Self {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            reply: Reply::Text(reply.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call raises `ToolSourceError::Transport(message)`.
    pub fn failing(names: &[&str], message: impl Into<String>) -> Self {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            reply: Reply::Fail(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// (name, arguments) of every call so far.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ToolSource for MockToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self
            .names
            .iter()
            .map(|n| ToolSpec::new(n.clone(), format!("mock tool {}", n), json!({"type": "object"})))
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((name.to_string(), arguments));
        }
        if !self.names.iter().any(|n| n == name) {
            return Err(ToolSourceError::NotFound(name.to_string()));
        }
        match &self.reply {
            Reply::Text(t) => Ok(ToolCallContent::text(t.clone())),
            Reply::Fail(m) => Err(ToolSourceError::Transport(m.clone())),
        }
    }
}
