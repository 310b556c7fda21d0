//! SQLite database handle used by the SQL tools and the ingestion helpers.
//!
//! One connection behind a mutex: statements from concurrent runs are serialized.
//! Blocking rusqlite calls run on `spawn_blocking`. The handle is passed
//! explicitly to whoever needs it and closed explicitly with [`SqliteDatabase::close`];
//! every operation after that fails with [`DatabaseError::Closed`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use thiserror::Error;

/// Rows shown per table by `table_info`.
pub const DEFAULT_SAMPLE_ROWS: usize = 3;

/// Longest cell text kept in sample rows.
const SAMPLE_CELL_MAX_CHARS: usize = 100;

/// Errors from the database handle.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Raw SQLite error; the text is what the model sees after `Error: `.
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database is closed")]
    Closed,
    #[error("table_names {0} not found in database")]
    UnknownTables(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("database task failed: {0}")]
    Join(String),
    #[error("database lock poisoned")]
    Poisoned,
}

/// Quotes an identifier for SQLite (`"name"`, with embedded quotes doubled).
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}

fn truncate_cell(mut s: String) -> String {
    if let Some((idx, _)) = s.char_indices().nth(SAMPLE_CELL_MAX_CHARS) {
        s.truncate(idx);
        s.push_str("...");
    }
    s
}

fn list_tables_blocking(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn describe_table_blocking(
    conn: &Connection,
    table: &str,
    sample_rows: usize,
) -> Result<String, DatabaseError> {
    let create: String = conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    let mut out = format!("\n{}\n", create.trim());
    if sample_rows == 0 {
        return Ok(out);
    }

    let sql = format!(
        "SELECT * FROM {} LIMIT {}",
        quote_identifier(table),
        sample_rows
    );
    let mut stmt = conn.prepare(&sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let n = columns.len();
    let mut rows = stmt.query([])?;
    let mut lines = vec![columns.join("\t")];
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(n);
        for i in 0..n {
            cells.push(truncate_cell(render_value(row.get_ref(i)?)));
        }
        lines.push(cells.join("\t"));
    }
    out.push_str(&format!(
        "\n/*\n{} rows from {} table:\n{}\n*/",
        sample_rows,
        table,
        lines.join("\n")
    ));
    Ok(out)
}

fn run_blocking(conn: &Connection, sql: &str) -> Result<String, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let n = stmt.column_count();
    if n == 0 {
        stmt.execute([])?;
        return Ok(String::new());
    }
    let mut rows = stmt.query([])?;
    let mut lines = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(n);
        for i in 0..n {
            cells.push(render_value(row.get_ref(i)?));
        }
        lines.push(cells.join(" | "));
    }
    Ok(lines.join("\n"))
}

/// SQLite database handle.
///
/// Cheap to share as `Arc<SqliteDatabase>`; all clones of the `Arc` see the same
/// connection and the same closed state.
pub struct SqliteDatabase {
    conn: Arc<Mutex<Option<Connection>>>,
    path: Option<PathBuf>,
    sample_rows: usize,
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl SqliteDatabase {
    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        tracing::debug!(path = %path.display(), "opened sqlite database");
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            path: Some(path),
            sample_rows: DEFAULT_SAMPLE_ROWS,
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            path: None,
            sample_rows: DEFAULT_SAMPLE_ROWS,
        })
    }

    /// Sets how many sample rows `table_info` prints per table.
    pub fn with_sample_rows(mut self, sample_rows: usize) -> Self {
        self.sample_rows = sample_rows;
        self
    }

    /// File path, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.conn.lock().map(|c| c.is_none()).unwrap_or(true)
    }

    /// Runs `f` on the connection in a blocking task.
    pub(crate) async fn with_conn<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, DatabaseError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| DatabaseError::Poisoned)?;
            let conn = guard.as_mut().ok_or(DatabaseError::Closed)?;
            f(conn)
        })
        .await
        .map_err(|e| DatabaseError::Join(e.to_string()))?
    }

    /// User table names, sorted.
    pub async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        self.with_conn(|conn| list_tables_blocking(conn)).await
    }

    /// CREATE statement plus sample rows for each table; all tables when `tables` is `None`.
    ///
    /// Any name that is not a table fails the whole call with `UnknownTables`.
    pub async fn table_info(&self, tables: Option<&[String]>) -> Result<String, DatabaseError> {
        let wanted: Option<Vec<String>> = tables.map(|t| t.to_vec());
        let sample_rows = self.sample_rows;
        self.with_conn(move |conn| {
            let all = list_tables_blocking(conn)?;
            let selected = match wanted {
                None => all,
                Some(wanted) => {
                    let missing: Vec<&str> = wanted
                        .iter()
                        .filter(|t| !all.contains(t))
                        .map(String::as_str)
                        .collect();
                    if !missing.is_empty() {
                        return Err(DatabaseError::UnknownTables(format!("{:?}", missing)));
                    }
                    wanted
                }
            };
            let parts = selected
                .iter()
                .map(|t| describe_table_blocking(conn, t, sample_rows))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(parts.join("\n\n"))
        })
        .await
    }

    /// Executes one statement. Queries return one line per row, cells joined by ` | `;
    /// other statements return an empty string.
    pub async fn run(&self, sql: &str) -> Result<String, DatabaseError> {
        let sql = sql.to_string();
        tracing::debug!(sql = %sql, "running query");
        self.with_conn(move |conn| run_blocking(conn, &sql)).await
    }

    /// Like `run`, but a failure comes back as `"Error: <message>"` text.
    pub async fn run_no_throw(&self, sql: &str) -> String {
        match self.run(sql).await {
            Ok(out) => out,
            Err(e) => format!("Error: {}", e),
        }
    }

    /// Executes a batch of statements (schema setup, fixtures).
    pub async fn execute_batch(&self, sql: &str) -> Result<(), DatabaseError> {
        let sql = sql.to_string();
        self.with_conn(move |conn| conn.execute_batch(&sql).map_err(DatabaseError::from))
            .await
    }

    /// Closes the connection. Idempotent.
    pub async fn close(&self) -> Result<(), DatabaseError> {
        let conn = Arc::clone(&self.conn);
        let taken = tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| DatabaseError::Poisoned)?;
            Ok::<_, DatabaseError>(guard.take())
        })
        .await
        .map_err(|e| DatabaseError::Join(e.to_string()))??;
        if let Some(conn) = taken {
            conn.close().map_err(|(_, e)| DatabaseError::Sqlite(e))?;
            tracing::debug!(path = ?self.path, "closed sqlite database");
        }
        Ok(())
    }
}

/// Removes a database file. Close every handle on it first.
pub fn delete_database_file(path: impl AsRef<Path>) -> Result<(), DatabaseError> {
    let path = path.as_ref();
    std::fs::remove_file(path)
        .map_err(|e| DatabaseError::Io(format!("{}: {}", path.display(), e)))?;
    tracing::info!(path = %path.display(), "deleted database file");
    Ok(())
}
