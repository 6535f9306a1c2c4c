mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliOverrides;
use guessgame_core::{GameError, SubmissionError};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "guessgame")]
#[command(about = "Number guessing game - bet on a number between 1 and 3")]
#[command(version)]
struct Cli {
    /// Config file (defaults to <config dir>/guessgame/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ethereum node URL
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Status proxy URL
    #[arg(long, global = true)]
    proxy_url: Option<String>,

    /// Game contract address
    #[arg(long, global = true)]
    contract: Option<String>,

    /// Expected chain ID
    #[arg(long, global = true)]
    chain_id: Option<u64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a player's guess for the current round
    Status {
        /// Player address
        address: String,
        /// Read the contract directly instead of asking the proxy
        #[arg(short, long)]
        direct: bool,
    },
    /// List the node's accounts and their guesses
    Accounts,
    /// Submit a single guess
    Guess {
        /// Number to guess (1-3)
        number: String,
        /// Bet amount in ETH
        #[arg(short, long, default_value = "0.01")]
        bet: String,
        /// Account to play from (defaults to the node's first account)
        #[arg(short, long)]
        account: Option<String>,
    },
    /// Play interactively
    Play {
        /// Account to play from (defaults to the node's first account)
        #[arg(short, long)]
        account: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "guessgame={0},guessgame_core={0}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let overrides = CliOverrides {
        rpc_url: cli.rpc_url,
        proxy_url: cli.proxy_url,
        contract: cli.contract,
        chain_id: cli.chain_id,
    };

    let result = match config::load_config(cli.config.as_deref(), &overrides) {
        Ok(config) => match cli.command {
            Commands::Status { address, direct } => {
                commands::handle_status_command(&config, &address, direct).await
            }
            Commands::Accounts => commands::handle_accounts_command(&config).await,
            Commands::Guess {
                number,
                bet,
                account,
            } => commands::handle_guess_command(&config, number, bet, account).await,
            Commands::Play { account } => commands::handle_play_command(&config, account).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        match e {
            GameError::Submission(failure) => {
                eprintln!("Error: {}", failure.user_message());
                if let Some(raw) = failure.raw() {
                    eprintln!("Details: {}", raw);
                }
                if matches!(failure, SubmissionError::AlreadyGuessed) {
                    eprintln!("Use 'guessgame status <address>' to see your current guess");
                }
            }
            GameError::Config(message) => {
                eprintln!("Error: {}", message);
                if message.contains("Contract address") {
                    eprintln!("Set CONTRACT_ADDRESS or pass --contract <address>");
                }
            }
            GameError::NetworkConnection(message) => {
                eprintln!("Error: Could not reach the node: {}", message);
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
