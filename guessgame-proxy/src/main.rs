mod server;

use clap::Parser;
use guessgame_core::{GameConfig, GameError};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 3001;

#[derive(Parser)]
#[command(name = "guessgame-proxy")]
#[command(about = "Read-only status API for the number guessing game")]
#[command(version)]
struct Cli {
    /// Port to listen on (defaults to $PORT, then 3001)
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "guessgame_proxy={0},guessgame_core={0},tower_http={0}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let port = match cli.port {
        Some(port) => port,
        None => match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| GameError::config(format!("Invalid PORT '{}': {}", raw, e)))?,
            Err(_) => DEFAULT_PORT,
        },
    };

    let state = server::AppState::from_config(&config)?;
    if !state.is_configured() {
        tracing::warn!("CONTRACT_ADDRESS is not set, status lookups will fail");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server running on port {}", port);
    tracing::info!(
        "Contract address: {}",
        config.contract_address.as_deref().unwrap_or("<not configured>")
    );
    tracing::info!("Ethereum node URL: {}", config.rpc_url);

    axum::serve(listener, server::router(state)).await?;
    Ok(())
}

fn load_config() -> guessgame_core::Result<GameConfig> {
    let config = GameConfig::from_env()?;
    config.validate()?;
    Ok(config)
}
