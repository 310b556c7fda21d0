//! sqlgraph CLI binary: ask questions about a SQLite database from the command line.
//!
//! Subcommands: `ask` (one question), `chat` (REPL), `ingest` (CSV → table), `tables`.

mod logging;
mod repl;

use clap::Parser;
use sqlgraph_cli::{ask, build_runner, ingest, list_tables, open_database, Args, Command, RunOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = config::load_and_apply(config::APP_NAME, None) {
        eprintln!("sqlgraph: config: {}", e);
    }

    let args = Args::parse();
    logging::init(args.verbose)?;
    let opts = match RunOptions::from_env(args.db.clone(), args.model.clone(), args.verbose) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("sqlgraph: {}", e);
            std::process::exit(2);
        }
    };

    let db = match open_database(&opts) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("sqlgraph: {}", e);
            std::process::exit(1);
        }
    };

    let result = run(&args, &opts, db.clone()).await;
    if let Err(e) = db.close().await {
        tracing::warn!(error = %e, "closing database failed");
    }
    if let Err(e) = result {
        eprintln!("sqlgraph: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(
    args: &Args,
    opts: &RunOptions,
    db: std::sync::Arc<sqlgraph::SqliteDatabase>,
) -> Result<(), Box<dyn std::error::Error>> {
    match &args.cmd {
        Command::Ask { .. } => {
            let question = args.question().unwrap_or_default();
            let runner = build_runner(opts, db)?;
            let answer = ask(&runner, vec![sqlgraph::Message::user(question)], opts.verbose).await?;
            println!("{}", answer);
        }
        Command::Chat => {
            let runner = build_runner(opts, db)?;
            repl::run_repl_loop(&runner, opts.verbose).await?;
        }
        Command::Ingest {
            csv,
            table,
            replace,
        } => {
            let report = ingest(&db, csv, table.as_deref(), *replace).await?;
            let columns: Vec<String> = report
                .columns
                .iter()
                .map(|(name, ty)| format!("{} {}", name, ty.as_sql()))
                .collect();
            println!(
                "{}: {} rows ({})",
                report.table,
                report.rows,
                columns.join(", ")
            );
        }
        Command::Tables => {
            for table in list_tables(&db).await? {
                println!("{}", table);
            }
        }
    }
    Ok(())
}
