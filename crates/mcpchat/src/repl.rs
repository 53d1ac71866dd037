//! Interactive read-answer loop.

use anyhow::{Context, Result};
use llm_mcp_bridge::{AgentSession, Transcript};
use owo_colors::OwoColorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = "you> ";

fn is_exit(line: &str) -> bool {
    matches!(line, "quit" | "exit" | "q")
}

/// Read queries until the user quits.
///
/// A failed turn leaves the conversation as it was before the query. Errors
/// that take the tool server down end the loop.
pub async fn run(session: &AgentSession) -> Result<()> {
    println!("{}", "mcpchat".bright_cyan().bold());
    println!("{}", "━".repeat(50).bright_black());
    if session.catalog.is_empty() {
        println!("{}", "No tools available".dimmed());
    } else {
        println!("Tools: {}", session.catalog.names().join(", ").bright_green());
    }
    println!("Type 'quit' or press Ctrl-D to leave\n");

    let mut rl = DefaultEditor::new().context("Failed to start line editor")?;
    let mut transcript: Option<Transcript> = None;

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("Failed to read input"),
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_exit(query) {
            break;
        }
        if let Err(err) = rl.add_history_entry(query) {
            tracing::debug!(error = %err, "History not updated");
        }

        let outcome = tokio::select! {
            result = session.run_turn(query, transcript.clone()) => result,
            _ = tokio::signal::ctrl_c() => {
                println!("\n{}", "Interrupted".yellow());
                break;
            }
        };

        match outcome {
            Ok((answer, updated)) => {
                println!("{} {}\n", "assistant>".bright_green().bold(), answer);
                transcript = Some(updated);
            }
            Err(err) if err.is_session_fatal() => {
                return Err(err).context("Tool server connection lost");
            }
            Err(err) => {
                eprintln!("{} {}", "error:".bright_red().bold(), err);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_words() {
        assert!(is_exit("quit"));
        assert!(is_exit("exit"));
        assert!(is_exit("q"));
        assert!(!is_exit("quit now"));
        assert!(!is_exit("Q?"));
    }
}
