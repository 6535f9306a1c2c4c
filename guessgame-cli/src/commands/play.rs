use super::status::print_status;
use super::{connect, short_address, submitter, Session};
use dialoguer::{Confirm, Input};
use guessgame_core::{
    lookup_status, GameConfig, GameError, GuessForm, GuessSubmitter, Result, SessionChange,
    StatusClient, MAX_GUESS, MIN_GUESS,
};

/// Interactive rounds against one wallet session until the player quits.
pub async fn handle_play_command(config: &GameConfig, account: Option<String>) -> Result<()> {
    let mut session = connect(config, account.as_deref()).await?;
    let submitter = submitter(config)?;
    let status = StatusClient::new(config.proxy_url.clone());
    let mut form = GuessForm::default();

    println!(
        "Guess a number between {} and {}. Minimum bet is {} ETH.",
        MIN_GUESS,
        MAX_GUESS,
        submitter.rules().min_bet_eth()
    );

    let outcome = play_rounds(&mut session, &submitter, &status, &mut form).await;
    session.disconnect();
    println!("Wallet disconnected.");
    outcome
}

async fn play_rounds(
    session: &mut Session,
    submitter: &GuessSubmitter<StatusClient>,
    status: &StatusClient,
    form: &mut GuessForm,
) -> Result<()> {
    loop {
        if !sync_session(session).await? {
            return Ok(());
        }

        let Some(account) = session.account() else {
            return Ok(());
        };
        println!();
        println!("Playing as {}", short_address(account));

        match lookup_status(status, &account.to_checksum(None)).await {
            Ok(view) if view.has_guessed => {
                print_status(&view);
                println!("You have already made a guess! Wait for the next round.");
                if !ask("Check again?", true)? {
                    return Ok(());
                }
                continue;
            }
            Ok(_) => {}
            Err(e) => println!("Could not check your game status: {}", e),
        }

        form.guess = Input::<String>::new()
            .with_prompt(format!("Your guess ({}-{})", MIN_GUESS, MAX_GUESS))
            .allow_empty(true)
            .with_initial_text(form.guess.clone())
            .interact_text()
            .map_err(|e| GameError::dialog(e.to_string()))?;
        form.bet_amount = Input::<String>::new()
            .with_prompt("Bet amount (ETH)")
            .default(form.bet_amount.clone())
            .interact_text()
            .map_err(|e| GameError::dialog(e.to_string()))?;

        println!("Processing your guess...");
        match submitter.submit(session, form).await {
            Ok(receipt) => {
                println!("Guess submitted successfully! Good luck!");
                println!("Transaction: {}", receipt.tx_hash);
            }
            Err(e) => {
                println!("{}", e.user_message());
                if let Some(raw) = e.raw() {
                    tracing::debug!("Submission failure details: {}", raw);
                }
            }
        }

        if !ask("Play another round?", true)? {
            return Ok(());
        }

        if let Some(warning) = session.check_network().await? {
            println!("Warning: {}", warning);
        }
    }
}

/// Applies queued wallet events. Returns `false` when the player chose not
/// to reconnect a dropped session.
async fn sync_session(session: &mut Session) -> Result<bool> {
    for change in session.poll_events() {
        match change {
            SessionChange::AccountSwitched(account) => {
                println!("Active account switched to {}", short_address(account));
            }
            SessionChange::Disconnected => println!("Wallet reported no accounts."),
            SessionChange::Reloaded { chain_id } => {
                println!("Network changed to chain {}, starting over.", chain_id);
                if let Some(warning) = session.check_network().await? {
                    println!("Warning: {}", warning);
                }
            }
            SessionChange::Ignored => {}
        }
    }

    if session.is_connected() {
        return Ok(true);
    }

    if !ask("Wallet is not connected. Connect now?", true)? {
        return Ok(false);
    }
    match session.connect().await {
        Ok(account) => {
            println!("Connected: {}", short_address(account));
            Ok(true)
        }
        Err(e) => {
            println!("{}", session.last_error().unwrap_or("Failed to connect wallet."));
            tracing::debug!("Connect failed: {}", e);
            Ok(false)
        }
    }
}

fn ask(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| GameError::dialog(e.to_string()))
}
