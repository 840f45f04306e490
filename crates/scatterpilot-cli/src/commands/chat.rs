//! Chat command - interactive invoice conversation.

use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use scatterpilot_core::{ChatRequest, ChatResponse, ConversationStore, ScatterError};

/// Arguments for the chat command.
#[derive(Args)]
pub struct ChatArgs {
    /// Reply immediately instead of simulating backend latency
    #[arg(long)]
    no_delay: bool,
}

pub async fn run(args: ChatArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let mut dialogue = config.dialogue.clone();
    dialogue.simulate_latency = !args.no_delay;
    let delay = dialogue.delay_policy();

    let mut store = ConversationStore::new(config);
    let mut conversation_id: Option<String> = None;

    println!(
        "{} Describe the invoice you need, e.g. \"Invoice Acme Corp for 10 cameras at $125\".",
        style("ScatterPilot").cyan().bold()
    );
    println!(
        "{}",
        style("Type 'reset' to start over or 'quit' to exit.").dim()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout
            .write_all(format!("{} ", style("you>").green().bold()).as_bytes())
            .await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        store.evict_expired(Instant::now());

        match line.to_lowercase().as_str() {
            "" => continue,
            "quit" | "exit" => break,
            "reset" => {
                let new_id = conversation_id
                    .as_deref()
                    .and_then(|id| store.reset(id));
                match new_id {
                    Some(id) => {
                        println!("{} New conversation {}", style("↺").blue(), id);
                        conversation_id = Some(id);
                    }
                    None => {
                        println!("{} Nothing to reset yet.", style("ℹ").blue());
                        conversation_id = None;
                    }
                }
                continue;
            }
            _ => {}
        }

        let request = ChatRequest::new(line, conversation_id.clone());
        let response = match store.handle(request) {
            Ok(response) => response,
            Err(ScatterError::Request(e)) => {
                println!("{} {}", style("✗").red(), e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if conversation_id.as_deref() != Some(response.conversation_id.as_str()) {
            debug!("Conversation {}", response.conversation_id);
            conversation_id = Some(response.conversation_id.clone());
        }

        typing_pause(delay.next_delay()).await;
        print_reply(&response)?;
    }

    Ok(())
}

async fn typing_pause(duration: Duration) {
    if duration.is_zero() {
        return;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message("typing...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    tokio::time::sleep(duration).await;
    spinner.finish_and_clear();
}

fn print_reply(response: &ChatResponse) -> anyhow::Result<()> {
    println!("{} {}", style("scatterpilot>").cyan().bold(), response.message);

    if let Some(payload) = &response.invoice_data {
        println!();
        println!("{}", serde_json::to_string_pretty(payload)?);
        println!();
        println!(
            "{} Invoice {} is ready. Type 'reset' to draft another.",
            style("✓").green(),
            payload.data.invoice_number
        );
    }

    Ok(())
}
