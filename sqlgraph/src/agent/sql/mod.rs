//! SQL agent: the node set, router and runner that answer a question over a database.
//!
//! Fixed prefix `first_tool_call → list_tables_tool → get_schema → get_schema_tool`
//! gathers schema, then the loop `generate_query → correct_query → execute_query →
//! generate_query` runs until the LLM calls `SubmitFinalAnswer`, which routes to
//! `give_final_answer` and END.
//!
//! # Main types
//!
//! - **[`ToolNode`]**: executes tool calls with the error fallback.
//! - **[`GenerateQueryNode`]**: loop head; enforces the final-answer protocol and the iteration cap.
//! - **[`SqlAgentRunner`]**: builds the graph per run and returns the answer.

mod build;
mod correct_query_node;
mod final_answer_node;
mod first_tool_call_node;
mod generate_query_node;
mod get_schema_node;
mod runner;
mod tool_node;

pub use build::{build_sql_agent_graph, SqlGraphOptions};
pub use correct_query_node::CorrectQueryNode;
pub use final_answer_node::GiveFinalAnswerNode;
pub use first_tool_call_node::{FirstToolCallNode, FIRST_TOOL_CALL_ID};
pub use generate_query_node::{
    GenerateQueryNode, IterationLimitPolicy, DEFAULT_MAX_QUERY_ATTEMPTS, ITERATION_LIMIT_CALL_ID,
};
pub use get_schema_node::GetSchemaNode;
pub use runner::{RunError, SqlAgentRunner};
pub use tool_node::ToolNode;

use crate::state::SqlAgentState;

pub const FIRST_TOOL_CALL: &str = "first_tool_call";
pub const LIST_TABLES_TOOL: &str = "list_tables_tool";
pub const GET_SCHEMA: &str = "get_schema";
pub const GET_SCHEMA_TOOL: &str = "get_schema_tool";
pub const GENERATE_QUERY: &str = "generate_query";
pub const CORRECT_QUERY: &str = "correct_query";
pub const EXECUTE_QUERY: &str = "execute_query";
pub const GIVE_FINAL_ANSWER: &str = "give_final_answer";

/// Name of the final-answer tool the LLM calls to finish.
pub const SUBMIT_FINAL_ANSWER: &str = "SubmitFinalAnswer";
/// Its single string argument.
pub const FINAL_ANSWER_ARG: &str = "final_answer";

/// Where the graph goes after `generate_query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    CorrectQuery,
    GenerateQuery,
    GiveFinalAnswer,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CorrectQuery => CORRECT_QUERY,
            Self::GenerateQuery => GENERATE_QUERY,
            Self::GiveFinalAnswer => GIVE_FINAL_ANSWER,
        }
    }
}

/// Conditional routing after `generate_query`.
///
/// Tool calls on the last message win (only `SubmitFinalAnswer` survives the
/// protocol check); an error-signalling last message loops back; anything else is
/// a candidate query.
pub fn route_after_generate_query(state: &SqlAgentState) -> Route {
    match state.last_message() {
        Some(m) if m.has_tool_calls() => Route::GiveFinalAnswer,
        Some(m) if m.signals_error() => Route::GenerateQuery,
        _ => Route::CorrectQuery,
    }
}
