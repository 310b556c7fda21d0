//! Integration test: tool nodes over the real SQL tool source.
//!
//! Data-shaped failures (bad SQL, empty result, unknown table) stay per call;
//! a raised failure (closed handle) answers every request. Calls to tools a node is
//! not bound to never run.

mod common;

use std::sync::Arc;

use serde_json::json;
use sqlgraph::agent::sql::ToolNode;
use sqlgraph::{
    Message, Node, SqlAgentState, SqlDatabaseToolSource, SqlPrompts, SqliteDatabase, ToolCall,
    ToolStatus,
};

use common::customers_db;

fn pending(calls: Vec<ToolCall>) -> SqlAgentState {
    SqlAgentState::from_history(vec![
        Message::user("q"),
        Message::assistant_with_tool_calls("", calls),
    ])
}

fn bound(id: &str, tool: &str, db: Arc<SqliteDatabase>) -> ToolNode {
    ToolNode::new(
        id,
        Arc::new(SqlDatabaseToolSource::new(db)),
        &[tool],
        Arc::new(SqlPrompts::default()),
    )
}

fn node(db: Arc<SqliteDatabase>) -> ToolNode {
    bound("execute_query", "db_query_tool", db)
}

fn query(sql: &str, id: &str) -> ToolCall {
    ToolCall::new("db_query_tool", json!({ "query": sql }), id)
}

/// **Scenario**: per-call outcomes for a mix of good, bad and empty queries.
#[tokio::test]
async fn data_shaped_errors_stay_per_call() {
    let db = Arc::new(customers_db(3).await);
    let state = pending(vec![
        query("SELECT COUNT(*) FROM customers", "ok"),
        query("SELECT nope FROM customers", "bad"),
        query("SELECT id FROM customers WHERE id > 100", "empty"),
        query("SELECT COUNT(*) FROM orders", "unknown"),
    ]);
    let update = node(db).run(&state).await.unwrap();
    let msgs = update.messages();
    assert_eq!(msgs.len(), 4);

    assert_eq!(msgs[0], Message::tool("3", "ok"));
    for (msg, id) in msgs[1..].iter().zip(["bad", "empty", "unknown"]) {
        match msg {
            Message::Tool(t) => {
                assert_eq!(t.tool_call_id, id);
                assert_eq!(t.status, ToolStatus::Error);
                assert!(t.content.starts_with("Error: "), "{}", t.content);
            }
            other => panic!("expected tool message, got {:?}", other),
        }
    }
    assert!(msgs[1].content().contains("no such column"));
    assert_eq!(
        msgs[2].content(),
        "Error: Query failed. Please rewrite your query and try again."
    );
    assert!(msgs[3].content().contains("orders"));
}

/// **Scenario**: N requests against a closed handle produce exactly N correlated
/// fallback messages.
#[tokio::test]
async fn closed_database_falls_back_for_every_request() {
    let db = Arc::new(customers_db(3).await);
    db.close().await.unwrap();
    let ids = ["a", "b", "c"];
    let state = pending(ids.iter().map(|id| query("SELECT 1", id)).collect());

    let update = node(db).run(&state).await.unwrap();
    let msgs = update.messages();
    assert_eq!(msgs.len(), ids.len());
    for (msg, id) in msgs.iter().zip(ids) {
        match msg {
            Message::Tool(t) => {
                assert_eq!(t.tool_call_id, id);
                assert_eq!(t.status, ToolStatus::Error);
                assert!(t.content.starts_with("Error: "));
                assert!(t.content.contains("closed"), "{}", t.content);
                assert!(t.content.ends_with("please fix your mistakes."));
            }
            other => panic!("expected tool message, got {:?}", other),
        }
    }
}

/// **Scenario**: a schema node handed a destructive query answers it with an error
/// and leaves the table in place.
#[tokio::test]
async fn schema_node_refuses_query_tool() {
    let db = Arc::new(customers_db(3).await);
    let state = pending(vec![query("DROP TABLE customers", "drop")]);
    let update = bound("get_schema_tool", "sql_db_schema", db.clone())
        .run(&state)
        .await
        .unwrap();
    assert_eq!(
        update.messages(),
        &[Message::tool_error(
            "Error: db_query_tool is not a valid tool, try one of [sql_db_schema].",
            "drop"
        )]
    );
    assert_eq!(db.list_tables().await.unwrap(), vec!["customers".to_string()]);
}

#[tokio::test]
async fn unbound_tool_does_not_discard_other_results() {
    let db = Arc::new(customers_db(1).await);
    let state = pending(vec![
        query("SELECT 1", "first"),
        ToolCall::new("drop_everything", json!({}), "second"),
    ]);
    let update = node(db).run(&state).await.unwrap();
    let msgs = update.messages();
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0], Message::tool("1", "first"));
    assert!(msgs[1].signals_error());
    assert!(msgs[1].content().contains("drop_everything"));
}

/// **Scenario**: tool nodes only append; earlier messages are untouched.
#[tokio::test]
async fn tool_results_append_to_state() {
    use sqlgraph::GraphState;

    let db = Arc::new(customers_db(2).await);
    let mut state = pending(vec![query("SELECT name FROM customers ORDER BY id", "q")]);
    let before = state.messages.clone();
    let update = node(db).run(&state).await.unwrap();
    state.apply(update);
    assert_eq!(&state.messages[..before.len()], &before[..]);
    assert_eq!(
        state.messages.last(),
        Some(&Message::tool("customer 1\ncustomer 2", "q"))
    );
}
