//! Canned Responder - CLI Entry Point

use anyhow::{Context, Result};
use canned_responder::{HttpServer, MockResponder, Registry, ServerConfig};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "canned-responder",
    about = "Configurable mock HTTP responder - replays uploaded canned responses",
    version
)]
struct Args {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (e.g., "127.0.0.1:8888")
    #[arg(short, long, value_name = "ADDR", conflicts_with = "port")]
    listen: Option<SocketAddr>,

    /// Port to listen on, on all interfaces
    #[arg(short, long)]
    port: Option<u16>,

    /// JSON file of responses loaded before serving
    #[arg(short, long)]
    responses: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and responses file, then exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        print!("{}", serde_yaml::to_string(&ServerConfig::default())?);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => {
            info!(path = ?path, "Loading configuration");
            ServerConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => ServerConfig::default(),
    };

    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(port) = args.port {
        config.listen = SocketAddr::from(([0, 0, 0, 0], port));
    }
    if args.responses.is_some() {
        config.responses_file = args.responses;
    }

    info!(
        listen = %config.listen,
        responses = ?config.responses_file,
        "Canned responder starting"
    );

    let registry = Arc::new(Registry::new());
    if let Some(path) = &config.responses_file {
        registry
            .store_file(path)
            .await
            .with_context(|| format!("Failed to store responses from {}", path.display()))?;
        info!(count = registry.len().await, "Loaded startup responses");
    }

    if args.validate {
        println!(
            "Configuration is valid ({} responses loaded)",
            registry.len().await
        );
        return Ok(());
    }

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to listen on {}", config.listen))?;

    let responder = Arc::new(MockResponder::new(registry, config.settings));
    HttpServer::new(responder.clone()).run(listener).await?;
    responder.log_summary().await;

    info!("Shutdown complete");
    Ok(())
}
