//! Terminal confirmation gate: a blocking retry-until-valid y/n read.

use ami_core::ConfirmationGate;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Interpret one line of input. `None` means the answer was not
/// recognizable and the question must be re-asked.
pub fn parse_answer(input: &str, default_accept: bool) -> Option<bool> {
    let answer = input.trim().to_lowercase();
    if answer.is_empty() {
        return Some(default_accept);
    }
    match answer.as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

pub struct TerminalGate;

impl TerminalGate {
    pub fn new() -> Self {
        Self
    }

    async fn write_line(&self, message: &str) {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(message.as_bytes()).await;
        let _ = stdout.write_all(b"\n").await;
        let _ = stdout.flush().await;
    }

    async fn write(&self, message: &str) {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(message.as_bytes()).await;
        let _ = stdout.flush().await;
    }
}

impl Default for TerminalGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfirmationGate for TerminalGate {
    async fn confirm(&self, prompt: &str, default_accept: bool) -> bool {
        let suffix = if default_accept { "[Y/n]" } else { "[y/N]" };
        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);

        loop {
            self.write(&format!("{} {}: ", prompt, suffix)).await;

            let mut line = String::new();
            match reader.read_line(&mut line).await {
                // EOF: nobody is there to approve, so decline.
                Ok(0) => return false,
                Ok(_) => match parse_answer(&line, default_accept) {
                    Some(decision) => return decision,
                    None => {
                        self.write_line("Please respond with 'y' or 'n'.").await;
                    }
                },
                Err(_) => return false,
            }
        }
    }

    async fn notify(&self, message: &str) {
        self.write_line(message).await;
    }
}
