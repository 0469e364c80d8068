//! Interactive chat command pinned to one video.

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::service::VideoChat;
use crate::video_id::VideoId;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(video: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check() {
        Output::error(&format!("{}", e));
        return Err(e);
    }

    // Resolve up front so a bad URL fails before the REPL starts.
    let video_id = VideoId::resolve(video)?;
    let chat = VideoChat::new(settings)?;

    println!("\n{}", style("Tubetalk Chat").bold().cyan());
    Output::kv("Video", &video_id.watch_url());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset the conversation.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        stdin.lock().read_line(&mut input)?;

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            chat.evict(video_id.as_str()).await?;
            Output::info("Conversation cleared.");
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        match chat.answer_for(video_id.as_str(), input).await {
            Ok(answer) => {
                spinner.finish_and_clear();
                println!("\n{} {}\n", style("Tubetalk:").cyan().bold(), answer);
            }
            Err(e) => {
                spinner.finish_and_clear();
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
