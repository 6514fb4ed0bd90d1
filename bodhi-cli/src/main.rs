//! CLI entry point for the Bodhi Guide chat relay

use anyhow::{Context, Result};
use bodhi_core::config::{Config, ConfigLoader};
use bodhi_core::format_response;
use bodhi_core::logging::init_logging;
use bodhi_manager::{run_server, AppState, ChatRelay, DEFAULT_SESSION_ID};
use bodhi_providers::{GeminiClient, GenerationParams, LLMProvider};
use clap::{Parser, Subcommand};
use console::style;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bodhi-guide")]
#[command(about = "Chat relay between the Bodhi Guide widget and Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP relay
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send one message through the relay and print the formatted reply
    Ask {
        /// Message to send
        #[arg(short, long)]
        message: String,
        /// Session key for conversation continuity
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config_loader = match cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };
    let config = config_loader
        .load()
        .with_context(|| format!("loading config from {}", config_loader.config_dir().display()))?;

    match cli.command {
        Commands::Serve { host, port } => {
            let _guard = init_logging(&config.logging);
            run_serve(config, host, port).await
        }
        Commands::Ask { message, session } => {
            init_console_logging();
            run_ask(&config, &message, session.as_deref()).await
        }
        Commands::Config => {
            init_console_logging();
            run_show_config(&config)
        }
    }
}

fn init_console_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_relay(config: &Config) -> Result<ChatRelay> {
    let provider: Arc<dyn LLMProvider> = Arc::new(
        GeminiClient::from_config(&config.provider).context("creating Gemini client")?,
    );
    Ok(ChatRelay::with_limits(
        provider,
        config.persona.to_persona(),
        GenerationParams::from_config(&config.provider),
        config.sessions.to_limits(),
    ))
}

async fn run_serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", host, port))?;

    let relay = build_relay(&config)?;
    info!(
        model = %config.provider.model,
        max_sessions = config.sessions.max_sessions,
        "Starting Bodhi Guide relay"
    );
    println!(
        "{} {}",
        style("Bodhi Guide relay listening on").bold().cyan(),
        addr
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n{}", style("Shutting down...").yellow());
            let _ = shutdown_tx.send(());
        }
    });

    run_server(AppState::new(relay), addr, shutdown_rx).await?;
    println!("{}", style("Relay stopped.").green());
    Ok(())
}

async fn run_ask(config: &Config, message: &str, session: Option<&str>) -> Result<()> {
    let relay = build_relay(config)?;
    let session = session.unwrap_or(DEFAULT_SESSION_ID);

    let reply = relay.handle(session, message).await?;
    println!("{}", format_response(&reply));
    Ok(())
}

fn run_show_config(config: &Config) -> Result<()> {
    let mut shown = config.clone();
    shown.provider.api_key = config.provider.masked_api_key();
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}
