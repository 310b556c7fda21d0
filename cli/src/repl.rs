//! Interactive chat loop: read stdin, answer, print, repeat until EOF or quit.
//!
//! History carries each question and its final answer, so follow-up questions can
//! refer to earlier ones.

use std::io::Write;

use sqlgraph::{Message, SqlAgentRunner};
use tokio::io::{AsyncBufReadExt, BufReader};

use sqlgraph_cli::ask;

fn is_quit_command(line: &str) -> bool {
    matches!(line.trim(), "quit" | "exit" | "/quit")
}

/// Runs the chat loop. On run error, prints to stderr and continues; the failed
/// question is dropped from the history.
pub async fn run_repl_loop(
    runner: &SqlAgentRunner,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = BufReader::new(tokio::io::stdin()).lines();
    let mut history: Vec<Message> = Vec::new();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = match reader.next_line().await? {
            None => break,
            Some(s) if s.trim().is_empty() => continue,
            Some(s) if is_quit_command(&s) => break,
            Some(s) => s,
        };

        let mut turn = history.clone();
        turn.push(Message::user(line.trim()));
        match ask(runner, turn.clone(), verbose).await {
            Ok(answer) => {
                println!("{}", answer);
                turn.push(Message::assistant(answer));
                history = turn;
            }
            Err(e) => eprintln!("error: {}", e),
        }
    }

    println!("Bye.");
    Ok(())
}
