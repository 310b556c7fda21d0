//! Agents built on the state graph.
//!
//! [`sql`] answers natural-language questions over a SQLite database.

pub mod sql;

pub use sql::{
    build_sql_agent_graph, route_after_generate_query, IterationLimitPolicy, Route, RunError,
    SqlAgentRunner, SqlGraphOptions,
};
