//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sqlgraph")]
#[command(about = "sqlgraph: ask natural-language questions about a SQLite database")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// SQLite database file (default: SQL_DB_PATH or sqlgraph.db)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Chat model name (default: OPENAI_MODEL or gpt-4o-mini)
    #[arg(long, global = true, value_name = "NAME")]
    pub model: Option<String>,

    /// Verbose: print the node trace to stderr while the graph runs
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Ask one question and print the answer
    Ask {
        /// Question text; multiple words are joined with spaces
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Interactive session; earlier questions and answers stay in the history
    Chat,
    /// Load a CSV file into a table
    Ingest {
        /// CSV file with a header row
        csv: PathBuf,
        /// Table name (default: standardized file stem)
        #[arg(long, value_name = "NAME")]
        table: Option<String>,
        /// Drop an existing table of the same name first
        #[arg(long)]
        replace: bool,
    },
    /// List the tables of the database
    Tables,
}

impl Args {
    /// Question text of `ask`, words joined with spaces.
    pub fn question(&self) -> Option<String> {
        match &self.cmd {
            Command::Ask { question } => Some(question.join(" ")),
            _ => None,
        }
    }
}
