//! Run orchestration: settings + CLI overrides → database, LLM, runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlgraph::ingest::standardize_name;
use sqlgraph::prompts::{self, SqlPrompts};
use sqlgraph::{
    add_table_from_csv, replace_table_from_csv, ChatOpenAI, DatabaseError, IngestError,
    IngestReport, Message, SqlAgentRunner, SqliteDatabase, StreamEvent,
};
use thiserror::Error;
use tokio_stream::StreamExt;
use tracing::info;

/// Options for one CLI invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub settings: config::Settings,
    /// Print the node trace to stderr.
    pub verbose: bool,
}

impl RunOptions {
    /// Settings from the environment with `--db` and `--model` applied on top.
    pub fn from_env(
        db: Option<PathBuf>,
        model: Option<String>,
        verbose: bool,
    ) -> Result<Self, RunError> {
        let mut settings = config::Settings::from_env()?;
        if let Some(db) = db {
            settings.db_path = db;
        }
        if let Some(model) = model {
            settings.model = model;
        }
        Ok(Self { settings, verbose })
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("settings: {0}")]
    Settings(#[from] config::SettingsError),
    #[error("database: {0}")]
    Database(#[from] DatabaseError),
    #[error("prompts: {0}")]
    Prompts(#[from] prompts::LoadError),
    #[error("run: {0}")]
    Run(#[from] sqlgraph::RunError),
    #[error("ingest: {0}")]
    Ingest(#[from] IngestError),
    #[error("graph: {0}")]
    Stream(String),
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot derive a table name from {0}; pass --table")]
    NoTableName(String),
}

/// Opens the configured database file.
pub fn open_database(opts: &RunOptions) -> Result<Arc<SqliteDatabase>, RunError> {
    Ok(Arc::new(SqliteDatabase::open(&opts.settings.db_path)?))
}

fn load_prompts(opts: &RunOptions) -> Result<SqlPrompts, RunError> {
    match &opts.settings.prompts_dir {
        Some(dir) => Ok(prompts::load(Some(dir.as_path()))?),
        None => Ok(prompts::default_from_embedded()),
    }
}

/// Builds the runner over `db` with an OpenAI-compatible client.
pub fn build_runner(
    opts: &RunOptions,
    db: Arc<SqliteDatabase>,
) -> Result<SqlAgentRunner, RunError> {
    let s = &opts.settings;
    let llm = ChatOpenAI::from_parts(s.model.clone(), s.api_key.as_deref(), s.base_url.as_deref())
        .with_temperature(s.temperature);
    info!(model = %s.model, db = %s.db_path.display(), "runner configured");
    Ok(SqlAgentRunner::new(Arc::new(llm), db)
        .with_prompts(load_prompts(opts)?)
        .with_max_query_attempts(s.max_query_attempts)
        .with_run_timeout(s.run_timeout))
}

/// Answers the last user message of `history`.
///
/// Verbose mode streams the run and prints each node as it starts; otherwise the
/// run is invoked. Both are bounded by the runner's run timeout.
pub async fn ask(
    runner: &SqlAgentRunner,
    history: Vec<Message>,
    verbose: bool,
) -> Result<String, RunError> {
    if !verbose {
        return Ok(runner.ask(history).await?);
    }

    let traced = ask_traced(runner, history);
    match runner.run_timeout() {
        Some(limit) => tokio::time::timeout(limit, traced)
            .await
            .map_err(|_| RunError::Run(sqlgraph::RunError::Timeout(limit)))?,
        None => traced.await,
    }
}

async fn ask_traced(runner: &SqlAgentRunner, history: Vec<Message>) -> Result<String, RunError> {
    let mut stream = runner.stream(history).await?;
    let mut last_state = None;
    let mut last_node: Option<String> = None;
    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::TaskStart { node_id } => {
                match last_node.as_deref() {
                    Some(from) => eprintln!("flow: {} → {}", from, node_id),
                    None => eprintln!("flow: START → {}", node_id),
                }
                last_node = Some(node_id);
            }
            StreamEvent::Updates { state, .. } => last_state = Some(state),
            StreamEvent::Error(e) => return Err(RunError::Stream(e)),
        }
    }
    if let Some(from) = last_node.as_deref() {
        eprintln!("flow: {} → END", from);
    }

    match last_state.as_ref().and_then(|s| s.last_message()) {
        Some(Message::Assistant(a)) if a.tool_calls.is_empty() => Ok(a.content.clone()),
        _ => Err(sqlgraph::RunError::NoAnswer.into()),
    }
}

/// Table name for `csv` when `--table` is absent: the standardized file stem.
pub fn default_table_name(csv: &Path) -> Result<String, RunError> {
    csv.file_stem()
        .and_then(|s| s.to_str())
        .map(standardize_name)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RunError::NoTableName(csv.display().to_string()))
}

/// Loads `csv` into `table` (default: file stem).
pub async fn ingest(
    db: &SqliteDatabase,
    csv: &Path,
    table: Option<&str>,
    replace: bool,
) -> Result<IngestReport, RunError> {
    let table = match table {
        Some(t) => t.to_string(),
        None => default_table_name(csv)?,
    };
    let file = std::fs::File::open(csv).map_err(|source| RunError::Io {
        path: csv.display().to_string(),
        source,
    })?;
    let report = if replace {
        replace_table_from_csv(db, file, &table).await?
    } else {
        add_table_from_csv(db, file, &table).await?
    };
    Ok(report)
}

/// Table names, sorted.
pub async fn list_tables(db: &SqliteDatabase) -> Result<Vec<String>, RunError> {
    Ok(db.list_tables().await?)
}
