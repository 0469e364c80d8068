//! Ask command implementation.

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::service::VideoChat;
use anyhow::Result;

/// Run the ask command: one question, one answer.
pub async fn run_ask(video: &str, question: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check() {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let chat = VideoChat::new(settings)?;

    let spinner = Output::spinner("Fetching transcript and generating answer...");

    match chat.answer_for(video, question).await {
        Ok(answer) => {
            spinner.finish_and_clear();
            println!("\n{}\n", answer);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
