mod cli;
mod config;
mod conversation;
mod groq_client;
mod web;

use std::io;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::ChatContext;
use crate::config::{AppConfig, ModelArgs, DEFAULT_WINDOW};
use crate::conversation::{ChatService, PromptAssembler};
use crate::groq_client::GroqClient;
use crate::web::AppState;

const DEFAULT_BIND: &str = "127.0.0.1:8501";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    model: ModelArgs,

    /// Address the web page listens on
    #[arg(short, long, env = "MEDIA_BIND", default_value = DEFAULT_BIND, global = true)]
    bind: SocketAddr,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the chat page over HTTP
    Serve,
    /// Chat in the terminal
    Chat {
        /// Send a single message, print the reply and exit
        #[arg(short, long)]
        input: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = match AppConfig::from_args(&cli.model) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    info!(model = %config.model, window = config.window, "Starting MedIA");
    if config.window >= DEFAULT_WINDOW {
        warn!(
            window = config.window,
            "Context window is effectively unbounded; pass --window to cap the history sent per request"
        );
    }

    let client = GroqClient::new(config.api_key.clone(), &config.base_url)?;
    let assembler = PromptAssembler::new(config.persona.clone(), config.model.clone(), config.sampling);
    let chat = ChatService::new(assembler, Arc::new(client), config.timeout);

    match cli.command {
        Some(Commands::Chat { input }) => {
            let mut chat_context = ChatContext::new(
                Box::new(io::stdout()),
                input,
                true,
                Arc::new(chat),
                config.window,
            );
            chat_context.run().await
        }
        // Default to serving the page if no subcommand is provided
        Some(Commands::Serve) | None => {
            web::serve(cli.bind, AppState::new(chat, config.window, config.session_idle)).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
