use super::{connect, submitter};
use comfy_table::{presets::UTF8_FULL, Table};
use guessgame_core::{format_ether, GameConfig, GuessForm, Result, SubmissionReceipt};

pub async fn handle_guess_command(
    config: &GameConfig,
    number: String,
    bet: String,
    account: Option<String>,
) -> Result<()> {
    let mut session = connect(config, account.as_deref()).await?;
    let submitter = submitter(config)?;
    let mut form = GuessForm::new(number, bet);

    println!("Processing your guess...");
    let outcome = submitter.submit(&session, &mut form).await;
    session.disconnect();

    let receipt = outcome?;
    if let Some(text) = submitter.state().status_text() {
        println!("{}", text);
    }
    print_receipt(&receipt);
    Ok(())
}

pub fn print_receipt(receipt: &SubmissionReceipt) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Attempt", "Account", "Guess", "Bet (ETH)", "Transaction", "Sent"]);
    table.add_row(vec![
        receipt.attempt_id.to_string(),
        receipt.account.to_checksum(None),
        receipt.guess.to_string(),
        format_ether(receipt.value),
        receipt.tx_hash.clone(),
        receipt.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]);
    println!("{}", table);
}
