use comfy_table::{presets::UTF8_FULL, Table};
use guessgame_core::{
    format_ether, lookup_status, GameConfig, GuessContract, GuessView, JsonRpcClient, Result,
    StatusClient, U256,
};
use std::sync::Arc;

pub async fn handle_status_command(
    config: &GameConfig,
    address: &str,
    direct: bool,
) -> Result<()> {
    let view = if direct {
        let rpc = Arc::new(JsonRpcClient::new(config.rpc_url.clone()));
        let contract = GuessContract::new(rpc, config.require_contract()?);
        lookup_status(&contract, address).await?
    } else {
        lookup_status(&StatusClient::new(config.proxy_url.clone()), address).await?
    };

    print_status(&view);
    Ok(())
}

pub fn print_status(view: &GuessView) {
    if !view.has_guessed {
        println!("No guess yet this round.");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Player", "Guess", "Bet (ETH)"]);
    table.add_row(vec![
        view.player.clone(),
        view.guessed_number.clone(),
        bet_in_ether(&view.amount),
    ]);
    println!("{}", table);
}

fn bet_in_ether(amount: &str) -> String {
    match U256::from_str_radix(amount, 10) {
        Ok(wei) => format_ether(wei),
        Err(_) => format!("{} wei", amount),
    }
}
