use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use chat_core::Config;
use clap::{Parser, Subcommand};
use colored::Colorize;
use relay_core::{Conversation, ConversationConfig, JsonlStore, ModelIdentity, SubmitRejected};
use relay_llm::HttpTransport;
use tokio::io::{AsyncBufReadExt, BufReader};

mod logging;
mod render;

use logging::init_logging;
use render::stream_exchange;

const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Stream chat completions from an upstream endpoint")]
#[command(version)]
struct Cli {
    /// Upstream chat endpoint (overrides API_BASE)
    #[arg(long)]
    endpoint: Option<String>,

    /// Model id (overrides MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single message
    Send {
        /// Message content
        message: String,

        /// Continue a stored conversation
        #[arg(long)]
        resume: Option<String>,
    },
    /// Start interactive chat
    Chat {
        /// Continue a stored conversation
        #[arg(long)]
        resume: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut config = Config::new();
    if let Some(endpoint) = cli.endpoint {
        config.api_base = Some(endpoint);
    }
    if let Some(model) = cli.model {
        config.model = Some(model);
    }

    if cli.debug {
        eprintln!("{}", "[DEBUG] Debug mode enabled".dimmed());
        eprintln!(
            "{}",
            format!(
                "[DEBUG] Endpoint: {}",
                config.api_base.as_deref().unwrap_or("<unset>")
            )
            .dimmed()
        );
    }

    match cli.command {
        Commands::Send { message, resume } => {
            let mut conversation = open_conversation(&config, resume).await?;
            send_once(&mut conversation, &message, cli.debug).await
        }
        Commands::Chat { resume } => {
            let mut conversation = open_conversation(&config, resume).await?;
            run_interactive_chat(&mut conversation, cli.debug).await
        }
    }
}

async fn open_conversation(config: &Config, resume: Option<String>) -> anyhow::Result<Conversation> {
    let transport = HttpTransport::from_config(config).context("failed to build HTTP client")?;

    let store = JsonlStore::new(chat_core::config::conversations_dir());
    store
        .init()
        .await
        .with_context(|| format!("failed to create {}", store.base_path().display()))?;

    let model_id = config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let model = ModelIdentity::new(model_id).with_display_name(config.model_label.clone());

    let mut conversation = Conversation::new(Arc::new(transport), model)
        .with_config(ConversationConfig::from(config))
        .with_store(Arc::new(store));

    if let Some(id) = resume {
        conversation = conversation.with_id(id);
        let restored = conversation.restore().await?;
        println!(
            "{}",
            format!("Resumed {} ({} messages)", conversation.id(), restored).dimmed()
        );
    }

    Ok(conversation)
}

async fn send_once(conversation: &mut Conversation, message: &str, debug: bool) -> anyhow::Result<()> {
    let handle = conversation.submit(message, &[]).await?;
    let rendered = stream_exchange(conversation, handle, debug).await?;
    conversation.wait().await;

    println!("{}", format!("Conversation: {}", conversation.id()).dimmed());
    if rendered.failed {
        anyhow::bail!("exchange failed");
    }
    Ok(())
}

async fn run_interactive_chat(conversation: &mut Conversation, debug: bool) -> anyhow::Result<()> {
    println!("{}", "🤖 Relay Interactive Chat".cyan().bold());
    println!("{}", format!("Conversation: {}", conversation.id()).dimmed());
    println!("{}", format!("Model: {}", conversation.model().label()).dimmed());
    println!(
        "{}",
        "Type '/model <id>' to switch, 'exit' or 'quit' to leave".dimmed()
    );
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let Some(input) = lines.next_line().await? else {
            break;
        };
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", "👋 Goodbye!".cyan());
            break;
        }
        if input.is_empty() {
            continue;
        }
        if let Some(rest) = input.strip_prefix("/model") {
            let id = rest.trim();
            if id.is_empty() {
                println!("{}", format!("Model: {}", conversation.model().label()).dimmed());
            } else {
                conversation.switch_model(ModelIdentity::new(id)).await;
                println!("{}", format!("Switched to {}", id).dimmed());
            }
            continue;
        }

        let handle = match conversation.submit(input, &[]).await {
            Ok(handle) => handle,
            Err(SubmitRejected::EmptyInput) => continue,
            Err(e) => {
                println!("{}", format!("❌ {}", e).red());
                continue;
            }
        };

        println!("{}", "Assistant:".green().bold());
        let rendered = stream_exchange(conversation, handle, debug).await?;
        conversation.wait().await;

        if let Some(model) = rendered.suggested_model {
            conversation.switch_model(ModelIdentity::new(model)).await;
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_with_global_overrides() {
        let cli = Cli::try_parse_from([
            "relay",
            "--endpoint",
            "http://localhost:9000/chat",
            "--model",
            "gpt-4o-mini",
            "send",
            "hello",
        ])
        .unwrap();

        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:9000/chat"));
        assert_eq!(cli.model.as_deref(), Some("gpt-4o-mini"));
        assert!(!cli.debug);
        match cli.command {
            Commands::Send { message, resume } => {
                assert_eq!(message, "hello");
                assert!(resume.is_none());
            }
            Commands::Chat { .. } => panic!("expected send"),
        }
    }

    #[test]
    fn parses_chat_resume() {
        let cli = Cli::try_parse_from(["relay", "-d", "chat", "--resume", "abc"]).unwrap();
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Chat { resume: Some(ref id) } if id == "abc"));
    }
}
