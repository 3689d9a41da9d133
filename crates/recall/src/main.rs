//! Recall daemon - JSON-RPC memory store server

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use recall_server::config::Config;
use recall_server::embedding::build_embedder;
use recall_server::engine::MemoryEngine;
use recall_server::error::Result;
use recall_server::rpc::RpcServer;

/// Recall - a multi-tenant memory store with hybrid search
#[derive(Parser)]
#[command(name = "recall")]
#[command(about = "A multi-tenant memory store with hybrid search and a knowledge graph")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the RPC server (default command)
    #[command(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(cli.config).await,
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,recall=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = config_path {
        tracing::info!("Loading config from: {}", path.display());
        return read_config(&path);
    }

    let default_paths = [
        dirs::home_dir().map(|h| h.join(".recall").join("config.toml")),
        dirs::config_dir().map(|c| c.join("recall").join("config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            tracing::info!("Loading config from: {}", path.display());
            return read_config(path);
        }
    }

    tracing::info!("No config file found, using defaults");
    Ok(Config::default())
}

fn read_config(path: &PathBuf) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        recall_server::RecallError::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;
    toml::from_str(&content)
        .map_err(|e| recall_server::RecallError::Config(format!("Failed to parse config: {e}")))
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting Recall daemon");

    let config = load_config(config_path)?;
    tracing::debug!("Config loaded: {:?}", config);

    tracing::info!(
        "Initializing embedding provider: {}",
        config.embedding.provider
    );
    let embedder = build_embedder(&config.embedding)?;

    let engine = Arc::new(MemoryEngine::new(config.search.clone(), embedder));

    let server = RpcServer::new(config.server.clone(), engine);
    tracing::info!("Listening on {}", config.server.listen_addr);

    server.serve().await?;

    tracing::info!("Recall daemon stopped");
    Ok(())
}
