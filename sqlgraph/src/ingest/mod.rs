//! CSV ingestion: load a sheet into a SQLite table the agent can query.
//!
//! Column and table names are standardized (lowercase, every non-alphanumeric
//! character replaced by `_`) so the model can write queries without quoting.
//! Column types are inferred from the data: INTEGER, then REAL, else TEXT; empty
//! cells become NULL.

use std::io::Read;
use std::sync::OnceLock;

use csv::ReaderBuilder;
use regex::Regex;
use rusqlite::types::Value;
use thiserror::Error;
use tracing::info;

use crate::db::{quote_identifier, DatabaseError, SqliteDatabase};

/// Errors from CSV ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv input has no header row")]
    EmptyInput,
    #[error("table {0} already exists")]
    TableExists(String),
    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// What an ingestion created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub table: String,
    pub columns: Vec<(String, ColumnType)>,
    pub rows: usize,
}

/// SQLite storage class picked for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }

    /// Narrowest type holding every non-empty cell.
    fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let mut ty = Self::Integer;
        let mut seen = false;
        for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
            seen = true;
            if ty == Self::Integer && cell.parse::<i64>().is_err() {
                ty = Self::Real;
            }
            if ty == Self::Real && cell.parse::<f64>().is_err() {
                return Self::Text;
            }
        }
        if seen {
            ty
        } else {
            Self::Text
        }
    }

    fn value(&self, cell: &str) -> Value {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match self {
            Self::Integer => trimmed
                .parse()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(cell.to_string())),
            Self::Real => trimmed
                .parse()
                .map(Value::Real)
                .unwrap_or_else(|_| Value::Text(cell.to_string())),
            Self::Text => Value::Text(cell.to_string()),
        }
    }
}

fn non_alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]").expect("static pattern"))
}

/// Lowercases a name and replaces every non-alphanumeric character with `_`.
pub fn standardize_name(name: &str) -> String {
    non_alphanumeric().replace_all(name, "_").to_lowercase()
}

/// [`standardize_name`] over a header row.
pub fn standardize_column_names<I, S>(columns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    columns
        .into_iter()
        .map(|c| standardize_name(c.as_ref()))
        .collect()
}

/// Parsed sheet: standardized headers and raw cells, short rows padded.
struct Sheet {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn read_sheet<R: Read>(reader: R) -> Result<Sheet, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(IngestError::EmptyInput);
    }
    let columns: Vec<String> = standardize_column_names(headers.iter().map(str::trim))
        .into_iter()
        .enumerate()
        .map(|(i, c)| if c.is_empty() { format!("column_{}", i + 1) } else { c })
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().take(columns.len()).map(String::from).collect();
        row.resize(columns.len(), String::new());
        rows.push(row);
    }
    Ok(Sheet { columns, rows })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IfExists {
    Fail,
    Replace,
}

async fn ingest<R: Read>(
    db: &SqliteDatabase,
    reader: R,
    table: &str,
    if_exists: IfExists,
) -> Result<IngestReport, IngestError> {
    let table = standardize_name(table.trim());
    if table.is_empty() {
        return Err(IngestError::InvalidTableName(table));
    }
    let sheet = read_sheet(reader)?;
    let types: Vec<ColumnType> = (0..sheet.columns.len())
        .map(|i| ColumnType::infer(sheet.rows.iter().map(|r| r[i].as_str())))
        .collect();

    let create = format!(
        "CREATE TABLE {} ({})",
        quote_identifier(&table),
        sheet
            .columns
            .iter()
            .zip(&types)
            .map(|(c, t)| format!("{} {}", quote_identifier(c), t.as_sql()))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let insert = format!(
        "INSERT INTO {} VALUES ({})",
        quote_identifier(&table),
        vec!["?"; sheet.columns.len()].join(", ")
    );
    let rows: Vec<Vec<Value>> = sheet
        .rows
        .iter()
        .map(|row| row.iter().zip(&types).map(|(cell, t)| t.value(cell)).collect())
        .collect();
    let row_count = rows.len();

    let name = table.clone();
    let created = db
        .with_conn(move |conn| {
            let tx = conn.transaction()?;
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                [&name],
                |row| row.get(0),
            )?;
            if exists {
                if if_exists == IfExists::Fail {
                    return Ok(false);
                }
                tx.execute_batch(&format!("DROP TABLE {}", quote_identifier(&name)))?;
            }
            tx.execute_batch(&create)?;
            {
                let mut stmt = tx.prepare(&insert)?;
                for row in &rows {
                    stmt.execute(rusqlite::params_from_iter(row.iter()))?;
                }
            }
            tx.commit()?;
            Ok(true)
        })
        .await?;
    if !created {
        return Err(IngestError::TableExists(table));
    }

    info!(table = %table, rows = row_count, columns = sheet.columns.len(), "ingested csv");
    Ok(IngestReport {
        table,
        columns: sheet.columns.into_iter().zip(types).collect(),
        rows: row_count,
    })
}

/// Creates `table` from CSV; fails with [`IngestError::TableExists`] if it is already there.
pub async fn add_table_from_csv<R: Read>(
    db: &SqliteDatabase,
    reader: R,
    table: &str,
) -> Result<IngestReport, IngestError> {
    ingest(db, reader, table, IfExists::Fail).await
}

/// Creates `table` from CSV, dropping any existing table of that name first.
pub async fn replace_table_from_csv<R: Read>(
    db: &SqliteDatabase,
    reader: R,
    table: &str,
) -> Result<IngestReport, IngestError> {
    ingest(db, reader, table, IfExists::Replace).await
}
