//! Terminal rendering of exchange events.

use std::io::{self, Write};

use colored::Colorize;
use relay_core::{Conversation, ExchangeEvent, ExchangeHandle};
use tokio_stream::StreamExt;

/// What the terminal saw of one exchange.
#[derive(Debug, Default)]
pub struct Rendered {
    pub suggested_model: Option<String>,
    pub failed: bool,
}

/// Print events until the terminal one. Ctrl-C requests a stop and keeps
/// printing so the paced tail and the `aborted` event still show.
pub async fn stream_exchange(
    conversation: &Conversation,
    handle: ExchangeHandle,
    debug: bool,
) -> anyhow::Result<Rendered> {
    let mut rendered = Rendered::default();
    let mut stopping = false;
    let mut stdout = io::stdout();

    if debug {
        eprintln!(
            "{}",
            format!("[DEBUG] Exchange {} started", handle.exchange_id()).dimmed()
        );
    }
    let mut events = handle.into_stream();

    loop {
        let event = tokio::select! {
            event = events.next() => event,
            _ = tokio::signal::ctrl_c(), if !stopping => {
                stopping = conversation.stop();
                continue;
            }
        };
        let Some(event) = event else {
            break;
        };

        match event {
            ExchangeEvent::Delta { content } => {
                print!("{}", content.green());
                stdout.flush()?;
            }
            ExchangeEvent::SearchStatus { status } => {
                let line = match status.query {
                    Some(query) => format!("🔎 Searching ({}): {}", status.state, query),
                    None => format!("🔎 Searching ({})", status.state),
                };
                eprintln!("{}", line.dimmed());
            }
            ExchangeEvent::SearchCleared => {
                if debug {
                    eprintln!("{}", "[DEBUG] Search status cleared".dimmed());
                }
            }
            ExchangeEvent::Fallback {
                suggested_model,
                reason,
            } => {
                println!();
                println!(
                    "{}",
                    format!("⚠️  Upstream degraded ({}); switching to {}", reason, suggested_model)
                        .yellow()
                );
                rendered.suggested_model = Some(suggested_model);
            }
            ExchangeEvent::Completed { .. } => {
                println!();
                break;
            }
            ExchangeEvent::Aborted { content } => {
                println!();
                println!(
                    "{}",
                    format!("⏹  Stopped ({} chars kept)", content.chars().count()).yellow()
                );
                break;
            }
            ExchangeEvent::Errored { message, .. } => {
                println!();
                println!("{}", format!("❌ Error: {}", message).red());
                rendered.failed = true;
                break;
            }
        }
    }

    Ok(rendered)
}
