use crate::contract::make_guess_calldata;
use crate::game::failure::{classify_send_failure, SubmissionError};
use crate::game::validation::{GuessForm, GuessRules, ValidGuess};
use crate::status::StatusSource;
use crate::units::format_ether;
use crate::wallet::{WalletProvider, WalletSession};
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub attempt_id: Uuid,
    pub tx_hash: String,
    pub account: Address,
    pub guess: u64,
    pub value: U256,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    CheckingStatus,
    Submitting,
    Succeeded(SubmissionReceipt),
    Failed(SubmissionError),
}

impl SubmissionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::CheckingStatus | Self::Submitting)
    }

    /// Status line for the player, `None` when there is nothing to show.
    pub fn status_text(&self) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::CheckingStatus | Self::Submitting => Some("Processing your guess...".to_string()),
            Self::Succeeded(_) => Some("Guess submitted successfully! Good luck!".to_string()),
            Self::Failed(err) => Some(err.user_message()),
        }
    }
}

/// Clears the in-flight mark if the submit future is dropped early.
struct InFlight<'a> {
    state: &'a Mutex<SubmissionState>,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn set(&self, next: SubmissionState) {
        *self.state.lock() = next;
    }

    fn finish(mut self, outcome: &Result<SubmissionReceipt, SubmissionError>) {
        self.set(match outcome {
            Ok(receipt) => SubmissionState::Succeeded(receipt.clone()),
            Err(err) => SubmissionState::Failed(err.clone()),
        });
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let mut state = self.state.lock();
            if state.is_in_flight() {
                tracing::warn!("Guess submission abandoned while in flight");
                *state = SubmissionState::Idle;
            }
        }
    }
}

/// Runs one guess at a time against the game contract.
pub struct GuessSubmitter<S: StatusSource + ?Sized> {
    status: Arc<S>,
    contract: Address,
    rules: GuessRules,
    state: Mutex<SubmissionState>,
}

impl<S: StatusSource + ?Sized> GuessSubmitter<S> {
    pub fn new(status: Arc<S>, contract: Address, rules: GuessRules) -> Self {
        Self {
            status,
            contract,
            rules,
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn rules(&self) -> &GuessRules {
        &self.rules
    }

    pub fn state(&self) -> SubmissionState {
        self.state.lock().clone()
    }

    /// Validates the form, refuses players who already guessed this round
    /// and sends `makeGuess` with the bet attached. The form is reset only
    /// when the transaction was accepted.
    pub async fn submit<P: WalletProvider + ?Sized>(
        &self,
        session: &WalletSession<P>,
        form: &mut GuessForm,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let flight = self.begin()?;
        let outcome = self.attempt(session, form, &flight).await;

        match &outcome {
            Ok(receipt) => tracing::info!(
                "Guess {} submitted by {}: {}",
                receipt.guess,
                receipt.account,
                receipt.tx_hash
            ),
            Err(err) if err.is_local() => tracing::debug!("Guess rejected: {}", err),
            Err(err) => tracing::error!(
                "Guess submission failed: {} ({})",
                err,
                err.raw().unwrap_or("no details")
            ),
        }

        flight.finish(&outcome);
        outcome
    }

    fn begin(&self) -> Result<InFlight<'_>, SubmissionError> {
        let mut state = self.state.lock();
        if state.is_in_flight() {
            return Err(SubmissionError::Busy);
        }
        *state = SubmissionState::CheckingStatus;

        Ok(InFlight {
            state: &self.state,
            finished: false,
        })
    }

    async fn attempt<P: WalletProvider + ?Sized>(
        &self,
        session: &WalletSession<P>,
        form: &mut GuessForm,
        flight: &InFlight<'_>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let account = session.account().ok_or(SubmissionError::NotConnected)?;
        let guess = self.rules.validate(form)?;

        tracing::info!("Checking game status for account: {}", account);
        let record = self.status.fetch_status(account).await.map_err(|e| {
            tracing::warn!("Error checking game status: {}", e);
            SubmissionError::StatusQuery(e.to_string())
        })?;
        if record.has_guessed {
            return Err(SubmissionError::AlreadyGuessed);
        }

        flight.set(SubmissionState::Submitting);
        let attempt_id = Uuid::new_v4();
        tracing::info!(
            "Submitting guess {} with {} ETH ({} wei), attempt {}",
            guess.number,
            format_ether(guess.value),
            guess.value,
            attempt_id
        );

        let tx_hash = session
            .provider()
            .request("eth_sendTransaction", self.transaction(account, &guess))
            .await
            .map_err(|e| classify_send_failure(&e, &self.rules.min_bet_eth()))?;

        form.reset();

        Ok(SubmissionReceipt {
            attempt_id,
            tx_hash: match tx_hash {
                Value::String(hash) => hash,
                other => other.to_string(),
            },
            account,
            guess: guess.number,
            value: guess.value,
            submitted_at: Utc::now(),
        })
    }

    fn transaction(&self, from: Address, guess: &ValidGuess) -> Value {
        json!([{
            "from": from.to_checksum(None),
            "to": self.contract.to_checksum(None),
            "value": format!("{:#x}", guess.value),
            "data": format!("0x{}", hex::encode(make_guess_calldata(guess.number))),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainSpec;
    use crate::game::validation::ValidationError;
    use crate::test_support::{FakeProvider, FakeStatus, FAKE_TX_HASH};
    use crate::wallet::{ProviderError, USER_REJECTED};
    use std::time::Duration;

    const CONTRACT: Address = Address::repeat_byte(0xcc);
    const PLAYER: Address = Address::repeat_byte(0x01);

    async fn connected(provider: &Arc<FakeProvider>) -> WalletSession<FakeProvider> {
        let mut session = WalletSession::new(provider.clone(), ChainSpec::default());
        session.connect().await.unwrap();
        session
    }

    fn submitter(status: &Arc<FakeStatus>) -> GuessSubmitter<FakeStatus> {
        GuessSubmitter::new(status.clone(), CONTRACT, GuessRules::default())
    }

    #[tokio::test]
    async fn test_submit_sends_payable_guess() {
        let provider = Arc::new(FakeProvider::new(vec![PLAYER]));
        let session = connected(&provider).await;
        let status = Arc::new(FakeStatus::new(false));
        let submitter = submitter(&status);
        let mut form = GuessForm::new("2", "0.01");

        let receipt = submitter.submit(&session, &mut form).await.unwrap();

        assert_eq!(receipt.tx_hash, FAKE_TX_HASH);
        assert_eq!(receipt.guess, 2);
        assert_eq!(receipt.value.to_string(), "10000000000000000");
        assert_eq!(receipt.account, PLAYER);
        assert_eq!(status.calls(), 1);
        assert_eq!(provider.sent_transactions(), 1);

        let tx = provider.params_of("eth_sendTransaction").unwrap();
        assert_eq!(tx[0]["from"], PLAYER.to_checksum(None));
        assert_eq!(tx[0]["to"], CONTRACT.to_checksum(None));
        assert_eq!(tx[0]["value"], "0x2386f26fc10000");
        assert_eq!(
            tx[0]["data"],
            format!("0x{}", hex::encode(make_guess_calldata(2)))
        );

        assert_eq!(form, GuessForm::default());
        assert!(matches!(submitter.state(), SubmissionState::Succeeded(_)));
        assert_eq!(
            submitter.state().status_text().unwrap(),
            "Guess submitted successfully! Good luck!"
        );
    }

    #[tokio::test]
    async fn test_already_guessed_blocks_before_transaction() {
        let provider = Arc::new(FakeProvider::new(vec![PLAYER]));
        let session = connected(&provider).await;
        let status = Arc::new(FakeStatus::new(true));
        let submitter = submitter(&status);
        let mut form = GuessForm::new("1", "0.01");

        let err = submitter.submit(&session, &mut form).await.unwrap_err();

        assert_eq!(err, SubmissionError::AlreadyGuessed);
        assert_eq!(provider.sent_transactions(), 0);
        // inputs survive a failed attempt
        assert_eq!(form, GuessForm::new("1", "0.01"));
        assert_eq!(submitter.state(), SubmissionState::Failed(err));
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_network_call() {
        let provider = Arc::new(FakeProvider::new(vec![PLAYER]));
        let session = connected(&provider).await;
        let status = Arc::new(FakeStatus::new(false));
        let submitter = submitter(&status);

        for (guess, bet) in [("0", "0.01"), ("4", "0.01"), ("1.5", "0.01"), ("2", "0.009")] {
            let mut form = GuessForm::new(guess, bet);
            let err = submitter.submit(&session, &mut form).await.unwrap_err();
            assert!(matches!(err, SubmissionError::Validation(_)), "{:?}", err);
        }

        let mut form = GuessForm::new("4", "0.01");
        let err = submitter.submit(&session, &mut form).await.unwrap_err();
        assert_eq!(
            err,
            SubmissionError::Validation(ValidationError::GuessOutOfRange { min: 1, max: 3 })
        );
        assert_eq!(
            submitter.state().status_text().unwrap(),
            "Please enter a valid number between 1 and 3"
        );

        assert_eq!(status.calls(), 0);
        assert_eq!(provider.sent_transactions(), 0);
    }

    #[tokio::test]
    async fn test_requires_connected_session() {
        let provider = Arc::new(FakeProvider::new(vec![PLAYER]));
        let session = WalletSession::new(provider.clone(), ChainSpec::default());
        let status = Arc::new(FakeStatus::new(false));
        let submitter = submitter(&status);

        let err = submitter
            .submit(&session, &mut GuessForm::new("1", "0.01"))
            .await
            .unwrap_err();

        assert_eq!(err, SubmissionError::NotConnected);
        assert_eq!(err.user_message(), "Please connect your wallet first!");
        assert_eq!(status.calls(), 0);
    }

    #[tokio::test]
    async fn test_status_failure_blocks_submission() {
        let provider = Arc::new(FakeProvider::new(vec![PLAYER]));
        let session = connected(&provider).await;
        let status = Arc::new(FakeStatus::failing("proxy unreachable"));
        let submitter = submitter(&status);

        let err = submitter
            .submit(&session, &mut GuessForm::new("3", "0.01"))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::StatusQuery(_)));
        assert!(err.raw().unwrap().contains("proxy unreachable"));
        assert_eq!(provider.sent_transactions(), 0);
    }

    #[tokio::test]
    async fn test_revert_is_mapped_to_message() {
        let provider = Arc::new(FakeProvider::new(vec![PLAYER]));
        provider.fail_send(ProviderError::new(
            -32603,
            "Error: VM Exception while processing transaction: reverted with reason string 'Minimum bet not met'",
        ));
        let session = connected(&provider).await;
        let status = Arc::new(FakeStatus::new(false));
        let submitter = submitter(&status);
        let mut form = GuessForm::new("3", "0.01");

        let err = submitter.submit(&session, &mut form).await.unwrap_err();

        assert_eq!(err.user_message(), "Minimum bet is 0.01 ETH!");
        assert!(err.raw().unwrap().contains("Minimum bet not met"));
        assert_eq!(form, GuessForm::new("3", "0.01"));
    }

    #[tokio::test]
    async fn test_user_rejection_allows_retry() {
        let provider = Arc::new(FakeProvider::new(vec![PLAYER]));
        provider.fail_send(ProviderError::new(USER_REJECTED, "User denied transaction"));
        let session = connected(&provider).await;
        let status = Arc::new(FakeStatus::new(false));
        let submitter = submitter(&status);

        let err = submitter
            .submit(&session, &mut GuessForm::new("1", "0.01"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::RejectedByUser(_)));
        assert!(!submitter.state().is_in_flight());

        let mut form = GuessForm::new("1", "0.01");
        assert!(matches!(
            submitter.submit(&session, &mut form).await,
            Err(SubmissionError::RejectedByUser(_))
        ));
        assert_eq!(provider.sent_transactions(), 2);
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_busy() {
        let provider = Arc::new(FakeProvider::new(vec![PLAYER]));
        provider.gate("eth_sendTransaction");
        let session = connected(&provider).await;
        let status = Arc::new(FakeStatus::new(false));
        let submitter = submitter(&status);
        let mut first_form = GuessForm::new("1", "0.01");
        let mut second_form = GuessForm::new("2", "0.01");

        let first = submitter.submit(&session, &mut first_form);
        let second = async {
            while !submitter.state().is_in_flight() {
                tokio::task::yield_now().await;
            }
            let outcome = submitter.submit(&session, &mut second_form).await;
            provider.release();
            outcome
        };

        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err(), SubmissionError::Busy);
        assert_eq!(provider.sent_transactions(), 1);
        assert_eq!(second_form, GuessForm::new("2", "0.01"));
        assert!(matches!(submitter.state(), SubmissionState::Succeeded(_)));
    }

    #[tokio::test]
    async fn test_dropped_submission_returns_to_idle() {
        let provider = Arc::new(FakeProvider::new(vec![PLAYER]));
        provider.gate("eth_sendTransaction");
        let session = connected(&provider).await;
        let status = Arc::new(FakeStatus::new(false));
        let submitter = submitter(&status);
        let mut form = GuessForm::new("1", "0.01");

        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            submitter.submit(&session, &mut form),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(submitter.state(), SubmissionState::Idle);
        assert_eq!(form, GuessForm::new("1", "0.01"));
    }
}
