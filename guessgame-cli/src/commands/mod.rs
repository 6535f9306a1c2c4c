pub mod accounts;
pub mod guess;
pub mod play;
pub mod status;

pub use accounts::handle_accounts_command;
pub use guess::handle_guess_command;
pub use play::handle_play_command;
pub use status::handle_status_command;

use guessgame_core::{
    parse_address, Address, GameConfig, GuessRules, GuessSubmitter, JsonRpcClient, Result,
    RpcWalletProvider, StatusClient, WalletSession,
};
use std::sync::Arc;

pub type Session = WalletSession<RpcWalletProvider>;

pub fn provider(config: &GameConfig, account: Option<&str>) -> Result<RpcWalletProvider> {
    let rpc = Arc::new(JsonRpcClient::new(config.rpc_url.clone()));
    let provider = RpcWalletProvider::new(rpc);
    Ok(match account {
        Some(raw) => provider.with_account(parse_address(raw)?),
        None => provider,
    })
}

/// Connects a session and prints a warning when the node is on another chain.
pub async fn connect(config: &GameConfig, account: Option<&str>) -> Result<Session> {
    let provider = Arc::new(provider(config, account)?);
    let mut session = WalletSession::new(provider, config.chain.clone());

    if let Some(warning) = session.check_network().await? {
        println!("Warning: {}", warning);
    }

    let account = session.connect().await?;
    println!("Connected: {}", short_address(account));
    Ok(session)
}

pub fn submitter(config: &GameConfig) -> Result<GuessSubmitter<StatusClient>> {
    let contract = config.require_contract()?;
    let rules = GuessRules::from_config(config)?;
    Ok(GuessSubmitter::new(
        Arc::new(StatusClient::new(config.proxy_url.clone())),
        contract,
        rules,
    ))
}

/// `0x1234...abcd` form used in headers.
pub fn short_address(address: Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
