//! sqlgraph CLI library: argument parsing and run orchestration.
//!
//! Used by the `sqlgraph` binary. Builds a [`SqlAgentRunner`](sqlgraph::SqlAgentRunner)
//! from [`config::Settings`] plus command-line overrides, then asks, chats, ingests or
//! lists tables.

pub mod args;
pub mod run;

pub use args::{Args, Command};
pub use run::{
    ask, build_runner, ingest, list_tables, open_database, RunError, RunOptions,
};
