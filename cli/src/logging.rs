//! Logging: `tracing` output goes to `LOG_FILE` or nowhere.
//!
//! stdout carries answers and stderr the `--verbose` node flow, so log lines never
//! reach the console. Without `LOG_FILE` no subscriber is installed.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,sqlgraph=debug,sqlgraph_cli=debug,config=debug"
    } else {
        "warn,sqlgraph=info,sqlgraph_cli=info"
    }
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// Appends plain-text logs to `LOG_FILE` when it is set.
///
/// `RUST_LOG` overrides the filter; otherwise `--verbose` raises the sqlgraph
/// targets from `info` to `debug` (node updates, routing, tool calls).
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let Ok(path) = std::env::var("LOG_FILE") else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    tracing::info!(path = %path, verbose, "sqlgraph logging to file");
    Ok(())
}
