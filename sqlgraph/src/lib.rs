//! # sqlgraph
//!
//! Answers natural-language questions over a SQLite database with an LLM-driven
//! state graph. The graph lists tables, fetches the relevant schema, then loops
//! generate → check → execute until the model submits a final answer through the
//! `SubmitFinalAnswer` tool, which a last node turns into prose.
//!
//! ## Design principles
//!
//! - **Borrowed state, tagged updates**: nodes read [`SqlAgentState`] by reference and
//!   return a [`StateUpdate`]; the graph merges it with [`GraphState::apply`].
//! - **Errors as data where the model can repair them**: bad SQL, empty results and
//!   wrong tool calls become error tool messages; only unrecoverable failures abort.
//! - **Bounded runs**: an attempt cap on query generation plus a graph recursion limit.
//!
//! ## Main modules
//!
//! - [`graph`]: build and run state graphs ([`StateGraph`], [`CompiledStateGraph`], [`Node`]).
//! - [`agent`]: [`agent::sql`] with the node set, [`route_after_generate_query`] and [`SqlAgentRunner`].
//! - [`state`]: [`SqlAgentState`], [`StateUpdate`].
//! - [`message`]: [`Message`], [`ToolCall`].
//! - [`llm`]: [`LlmClient`] trait, [`MockLlm`], [`ChatOpenAI`].
//! - [`tool_source`]: [`ToolSource`], [`SqlDatabaseToolSource`], [`MockToolSource`].
//! - [`db`]: [`SqliteDatabase`].
//! - [`prompts`]: [`SqlPrompts`] loaded from YAML.
//! - [`ingest`]: CSV to table.
//! - [`stream`]: [`StreamEvent`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sqlgraph::{ChatOpenAI, Message, SqlAgentRunner, SqliteDatabase};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Arc::new(SqliteDatabase::open("shop.db")?);
//! let llm = Arc::new(ChatOpenAI::new("gpt-4o-mini"));
//! let runner = SqlAgentRunner::new(llm, db.clone());
//! let answer = runner
//!     .ask(vec![Message::user("How many customers are there?")])
//!     .await?;
//! println!("{}", answer);
//! db.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod db;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod llm;
pub mod message;
pub mod prompts;
pub mod state;
pub mod stream;
pub mod tool_source;

pub use agent::sql::{
    build_sql_agent_graph, route_after_generate_query, IterationLimitPolicy, Route, RunError,
    SqlAgentRunner, SqlGraphOptions,
};
pub use db::{DatabaseError, SqliteDatabase};
pub use error::AgentError;
pub use graph::{
    CompilationError, CompiledStateGraph, GraphState, Node, StateGraph, END, START,
};
pub use ingest::{add_table_from_csv, replace_table_from_csv, IngestError, IngestReport};
pub use llm::{ChatOpenAI, LlmClient, LlmResponse, MockLlm, ToolBinding, ToolChoiceMode};
pub use message::{Message, ToolCall, ToolStatus};
pub use prompts::SqlPrompts;
pub use state::{SqlAgentState, StateUpdate};
pub use stream::StreamEvent;
pub use tool_source::{
    MockToolSource, SqlDatabaseToolSource, ToolCallContent, ToolSource, ToolSourceError, ToolSpec,
};
