//! Integration test: load a CSV file into a database file, then answer over it.

mod common;

use std::fs::File;
use std::sync::Arc;

use sqlgraph::ingest::ColumnType;
use sqlgraph::{
    add_table_from_csv, replace_table_from_csv, IngestError, Message, MockLlm, SqlAgentRunner,
    SqliteDatabase,
};

use common::{happy_path_script, QUESTION};

fn write_csv(dir: &std::path::Path, rows: usize) -> std::path::PathBuf {
    let mut body = String::from("Customer ID,Full Name,Balance ($)\n");
    for i in 1..=rows {
        body.push_str(&format!("{},Customer {},{}.5\n", i, i, i));
    }
    let path = dir.join("customers.csv");
    std::fs::write(&path, body).unwrap();
    path
}

/// **Scenario**: an ingested 42-row CSV is visible to the agent as `customers` with
/// standardized column names, and survives reopening the file.
#[tokio::test]
async fn ingested_table_is_answerable() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), 42);
    let db_path = dir.path().join("shop.db");

    {
        let db = SqliteDatabase::open(&db_path).unwrap();
        let report = add_table_from_csv(&db, File::open(&csv).unwrap(), "customers")
            .await
            .unwrap();
        assert_eq!(report.rows, 42);
        assert_eq!(
            report.columns,
            vec![
                ("customer_id".to_string(), ColumnType::Integer),
                ("full_name".to_string(), ColumnType::Text),
                ("balance____".to_string(), ColumnType::Real),
            ]
        );
        db.close().await.unwrap();
    }

    let db = Arc::new(SqliteDatabase::open(&db_path).unwrap());
    let schema = db.table_info(None).await.unwrap();
    assert!(schema.contains("customer_id"), "{}", schema);
    assert_eq!(db.run("SELECT COUNT(*) FROM customers").await.unwrap(), "42");

    let llm = Arc::new(MockLlm::scripted(happy_path_script("42")));
    let runner = SqlAgentRunner::new(llm, db.clone());
    let answer = runner.ask(vec![Message::user(QUESTION)]).await.unwrap();
    assert!(answer.contains("42"));
    db.close().await.unwrap();
}

#[tokio::test]
async fn add_refuses_existing_table_and_replace_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let db = SqliteDatabase::open_in_memory().unwrap();

    let csv = write_csv(dir.path(), 5);
    add_table_from_csv(&db, File::open(&csv).unwrap(), "customers")
        .await
        .unwrap();

    let csv = write_csv(dir.path(), 2);
    let err = add_table_from_csv(&db, File::open(&csv).unwrap(), "customers")
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::TableExists(ref t) if t == "customers"));
    assert_eq!(db.run("SELECT COUNT(*) FROM customers").await.unwrap(), "5");

    replace_table_from_csv(&db, File::open(&csv).unwrap(), "customers")
        .await
        .unwrap();
    assert_eq!(db.run("SELECT COUNT(*) FROM customers").await.unwrap(), "2");
}
