//! Shared fixtures: a customers database and scripted LLM turns.

#![allow(dead_code)]

use serde_json::json;
use sqlgraph::{LlmResponse, SqliteDatabase, ToolCall};

pub const QUESTION: &str = "How many customers are there?";
pub const COUNT_SQL: &str = "SELECT COUNT(*) FROM customers;";

/// In-memory database with `n` rows in `customers`.
pub async fn customers_db(n: usize) -> SqliteDatabase {
    let db = SqliteDatabase::open_in_memory().expect("open in-memory db");
    let mut sql = String::from(
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, city TEXT);\n",
    );
    for i in 1..=n {
        sql.push_str(&format!(
            "INSERT INTO customers (id, name, city) VALUES ({}, 'customer {}', 'city {}');\n",
            i,
            i,
            i % 5
        ));
    }
    db.execute_batch(&sql).await.expect("seed customers");
    db
}

/// `get_schema` reply: ask for the schema of `tables`.
pub fn schema_call(tables: &str) -> LlmResponse {
    LlmResponse::with_tool_calls(
        "",
        vec![ToolCall::new(
            "sql_db_schema",
            json!({ "table_names": tables }),
            "schema_1",
        )],
    )
}

/// `correct_query` reply: run `sql`.
pub fn query_call(sql: &str, id: &str) -> LlmResponse {
    LlmResponse::with_tool_calls(
        "",
        vec![ToolCall::new("db_query_tool", json!({ "query": sql }), id)],
    )
}

/// `generate_query` reply that finishes the loop.
pub fn submit(answer: &str) -> LlmResponse {
    LlmResponse::with_tool_calls(
        "",
        vec![ToolCall::new(
            "SubmitFinalAnswer",
            json!({ "final_answer": answer }),
            "final_1",
        )],
    )
}

/// Script for the shortest successful run over `customers_db`.
pub fn happy_path_script(answer: &str) -> Vec<LlmResponse> {
    vec![
        schema_call("customers"),
        LlmResponse::text(COUNT_SQL),
        query_call(COUNT_SQL, "query_1"),
        submit(answer),
        LlmResponse::text(format!("There are {} customers.", answer)),
    ]
}
