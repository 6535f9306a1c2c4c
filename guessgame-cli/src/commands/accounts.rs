use super::{provider, short_address};
use comfy_table::{presets::UTF8_FULL, Table};
use guessgame_core::{lookup_status, GameConfig, GameError, Result, StatusClient};

/// Lists the node's accounts with their guess for the current round.
pub async fn handle_accounts_command(config: &GameConfig) -> Result<()> {
    let provider = provider(config, None)?;
    let accounts = provider
        .accounts()
        .await
        .map_err(|e| GameError::session(format!("Failed to list accounts: {}", e)))?;

    if accounts.is_empty() {
        println!("The node at {} exposes no accounts.", config.rpc_url);
        return Ok(());
    }

    let status = StatusClient::new(config.proxy_url.clone());
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Account", "Short", "Guess"]);

    for (index, account) in accounts.iter().enumerate() {
        let guess = match lookup_status(&status, &account.to_checksum(None)).await {
            Ok(view) if view.has_guessed => view.guessed_number,
            Ok(_) => "-".to_string(),
            Err(e) => {
                tracing::debug!("Status lookup for {} failed: {}", account, e);
                "unknown".to_string()
            }
        };
        table.add_row(vec![
            index.to_string(),
            account.to_checksum(None),
            short_address(*account),
            guess,
        ]);
    }

    println!("{}", table);
    Ok(())
}
