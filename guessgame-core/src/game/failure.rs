use crate::contract::{REVERT_ALREADY_GUESSED, REVERT_MINIMUM_BET};
use crate::game::validation::ValidationError;
use crate::wallet::{ProviderError, DISCONNECTED};
use thiserror::Error;

/// Why a guess did not make it on chain. `Display` is the text shown to the
/// player; [`SubmissionError::raw`] keeps the underlying message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("A guess is already being submitted. Please wait.")]
    Busy,

    #[error("Please connect your wallet first!")]
    NotConnected,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("You have already made a guess! Wait for the next round.")]
    AlreadyGuessed,

    #[error("Could not check your game status. Please try again.")]
    StatusQuery(String),

    #[error("Transaction was rejected in your wallet.")]
    RejectedByUser(String),

    #[error("You have already made a guess!")]
    RevertedAlreadyGuessed(String),

    #[error("Minimum bet is {min_bet} ETH!")]
    RevertedMinimumBet { min_bet: String, raw: String },

    #[error("Could not reach the network: {0}")]
    Network(String),

    #[error("Error submitting guess: {0}")]
    Other(String),
}

impl SubmissionError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Underlying provider or proxy message, for diagnostics.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::StatusQuery(raw)
            | Self::RejectedByUser(raw)
            | Self::RevertedAlreadyGuessed(raw)
            | Self::RevertedMinimumBet { raw, .. }
            | Self::Network(raw)
            | Self::Other(raw) => Some(raw),
            _ => None,
        }
    }

    /// True when nothing was sent over the network.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Busy | Self::NotConnected | Self::Validation(_))
    }
}

/// Maps a failed `eth_sendTransaction` to a submission error.
///
/// The contract reports failures only as revert strings, so known reasons
/// are matched by substring.
pub fn classify_send_failure(err: &ProviderError, min_bet: &str) -> SubmissionError {
    let raw = err.message.clone();
    let haystack = match &err.data {
        Some(data) => format!("{} {}", err.message, data),
        None => err.message.clone(),
    };

    if haystack.contains(REVERT_ALREADY_GUESSED) {
        SubmissionError::RevertedAlreadyGuessed(raw)
    } else if haystack.contains(REVERT_MINIMUM_BET) {
        SubmissionError::RevertedMinimumBet {
            min_bet: min_bet.to_string(),
            raw,
        }
    } else if err.is_user_rejection() {
        SubmissionError::RejectedByUser(raw)
    } else if err.code == Some(DISCONNECTED) {
        SubmissionError::Network(raw)
    } else {
        SubmissionError::Other(raw)
    }
}
