//! Interactive question loop.

use std::io::Write;

use contextor::{GREETING_REPLY, TravelAssistant, is_greeting};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;

const EXIT_WORDS: [&str; 3] = ["quit", "exit", "q"];
const PROMPT: &str = "\nWhat would you like to know about your journey? ";
const SEPARATOR: &str = "--------------------------------------------------";

pub async fn run_stdio(assistant: &TravelAssistant) -> std::io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    run(assistant, stdin, &mut std::io::stdout()).await
}

/// Reads questions line by line until an exit word or end of input.
pub async fn run<R, W>(assistant: &TravelAssistant, input: R, out: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "\nWelcome to your Travel Assistant!")?;
    writeln!(out, "You can ask questions about your journey details.")?;
    writeln!(out, "Type 'quit' to exit.")?;

    let mut lines = input.lines();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();

        if EXIT_WORDS.contains(&query.to_lowercase().as_str()) {
            writeln!(out, "Thank you for using Travel Assistant!")?;
            break;
        }
        if query.is_empty() {
            writeln!(out, "Please ask a question!")?;
            continue;
        }
        if is_greeting(query) {
            writeln!(out, "\nAI Response:\n{GREETING_REPLY}")?;
            continue;
        }

        match assistant.ask(query, None, None).await {
            Ok(qa) => {
                writeln!(out, "\nRelevant documents found:")?;
                for doc in &qa.similar_docs {
                    writeln!(out, "{SEPARATOR}\n{doc}")?;
                }
                writeln!(out, "\nAI Response:\n{}", qa.answer)?;
            }
            Err(e) => {
                warn!(error = %e, "question failed");
                writeln!(out, "\nSorry, I could not answer that right now: {e}")?;
            }
        }
    }
    Ok(())
}
