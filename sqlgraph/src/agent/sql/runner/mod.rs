//! SQL agent runner: builds the graph per run, seeds state, invokes or streams.

mod error;

pub use error::RunError;

use std::sync::Arc;
use std::time::Duration;

use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::db::SqliteDatabase;
use crate::graph::CompiledStateGraph;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::SqlPrompts;
use crate::state::SqlAgentState;
use crate::stream::StreamEvent;
use crate::tool_source::SqlDatabaseToolSource;

use super::{build_sql_agent_graph, IterationLimitPolicy, SqlGraphOptions};

/// Answers questions over one database with one LLM.
///
/// Cheap to share behind an `Arc`: each run builds its own graph and state, so
/// concurrent runs only meet at the database mutex.
///
/// # Example
///
/// ```rust,ignore
/// let runner = SqlAgentRunner::new(llm, db).with_run_timeout(Duration::from_secs(60));
/// let answer = runner.ask(vec![Message::user("How many customers are there?")]).await?;
/// ```
pub struct SqlAgentRunner {
    llm: Arc<dyn LlmClient>,
    db: Arc<SqliteDatabase>,
    prompts: Arc<SqlPrompts>,
    options: SqlGraphOptions,
    run_timeout: Option<Duration>,
}

impl SqlAgentRunner {
    pub fn new(llm: Arc<dyn LlmClient>, db: Arc<SqliteDatabase>) -> Self {
        Self {
            llm,
            db,
            prompts: Arc::new(SqlPrompts::default()),
            options: SqlGraphOptions::default(),
            run_timeout: None,
        }
    }

    pub fn with_max_query_attempts(mut self, max_query_attempts: u32) -> Self {
        self.options.max_query_attempts = max_query_attempts;
        self
    }

    pub fn with_iteration_policy(mut self, policy: IterationLimitPolicy) -> Self {
        self.options.iteration_policy = policy;
        self
    }

    pub fn with_recursion_limit(mut self, recursion_limit: usize) -> Self {
        self.options.recursion_limit = recursion_limit;
        self
    }

    /// Bounds `ask` and `invoke`; `None` disables the bound.
    pub fn with_run_timeout(mut self, run_timeout: Option<Duration>) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    pub fn with_prompts(mut self, prompts: SqlPrompts) -> Self {
        self.prompts = Arc::new(prompts);
        self
    }

    /// Bound applied by `ask` and `invoke`; stream consumers apply it themselves.
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout
    }

    pub fn database(&self) -> &Arc<SqliteDatabase> {
        &self.db
    }

    /// Reads the current schema and compiles a fresh graph.
    pub async fn compile(&self) -> Result<CompiledStateGraph<SqlAgentState>, RunError> {
        let table_info = self.db.table_info(None).await?;
        let tools = Arc::new(SqlDatabaseToolSource::new(self.db.clone()));
        Ok(build_sql_agent_graph(
            self.llm.clone(),
            tools,
            self.prompts.clone(),
            table_info,
            self.options,
        )?)
    }

    /// Runs one turn over `history` and returns the final state.
    pub async fn invoke(&self, history: Vec<Message>) -> Result<SqlAgentState, RunError> {
        let graph = self.compile().await?;
        let state = SqlAgentState::from_history(history);
        info!(history = state.messages.len(), "sql agent run started");

        let run = graph.invoke(state);
        let final_state = match self.run_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| RunError::Timeout(limit))??,
            None => run.await?,
        };

        info!(
            messages = final_state.messages.len(),
            query_attempts = final_state.query_attempts,
            "sql agent run finished"
        );
        Ok(final_state)
    }

    /// Runs one turn and returns the answer text.
    pub async fn ask(&self, history: Vec<Message>) -> Result<String, RunError> {
        let state = self.invoke(history).await?;
        match state.last_message() {
            Some(Message::Assistant(a)) if a.tool_calls.is_empty() => Ok(a.content.clone()),
            _ => Err(RunError::NoAnswer),
        }
    }

    /// Streams one turn. The run timeout is not applied here: wrap consumption in
    /// [`run_timeout`](Self::run_timeout). Dropping the stream stops the run.
    pub async fn stream(
        &self,
        history: Vec<Message>,
    ) -> Result<ReceiverStream<StreamEvent<SqlAgentState>>, RunError> {
        let graph = self.compile().await?;
        Ok(graph.stream(SqlAgentState::from_history(history)))
    }
}
