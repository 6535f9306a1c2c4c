use crate::config::{GameConfig, MAX_GUESS, MIN_GUESS};
use crate::error::Result;
use crate::units::{format_ether, parse_ether};
use alloy_primitives::U256;
use thiserror::Error;

pub const DEFAULT_BET: &str = "0.01";

/// Raw text the player typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessForm {
    pub guess: String,
    pub bet_amount: String,
}

impl Default for GuessForm {
    fn default() -> Self {
        Self {
            guess: String::new(),
            bet_amount: DEFAULT_BET.to_string(),
        }
    }
}

impl GuessForm {
    pub fn new(guess: impl Into<String>, bet_amount: impl Into<String>) -> Self {
        Self {
            guess: guess.into(),
            bet_amount: bet_amount.into(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid number between {min} and {max}")]
    GuessOutOfRange { min: u64, max: u64 },

    #[error("Minimum bet amount is {min} ETH")]
    BetTooSmall { min: String },

    #[error("Bet amount must be a decimal ETH value with at most 18 decimal places")]
    MalformedBet,
}

/// A form that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidGuess {
    pub number: u64,
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessRules {
    pub min_guess: u64,
    pub max_guess: u64,
    pub min_bet: U256,
}

impl Default for GuessRules {
    fn default() -> Self {
        Self {
            min_guess: MIN_GUESS,
            max_guess: MAX_GUESS,
            min_bet: U256::from(10_000_000_000_000_000u64),
        }
    }
}

impl GuessRules {
    pub fn from_config(config: &GameConfig) -> Result<Self> {
        Ok(Self {
            min_bet: config.min_bet()?,
            ..Self::default()
        })
    }

    pub fn min_bet_eth(&self) -> String {
        format_ether(self.min_bet)
    }

    pub fn validate(&self, form: &GuessForm) -> std::result::Result<ValidGuess, ValidationError> {
        let guess = form.guess.trim();
        let number = Some(guess)
            .filter(|g| !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|g| g.parse::<u64>().ok())
            .filter(|n| (self.min_guess..=self.max_guess).contains(n))
            .ok_or(ValidationError::GuessOutOfRange {
                min: self.min_guess,
                max: self.max_guess,
            })?;

        // an empty bet counts as zero
        let bet = form.bet_amount.trim();
        let value = if bet.is_empty() {
            U256::ZERO
        } else {
            parse_ether(bet).map_err(|_| ValidationError::MalformedBet)?
        };
        if value < self.min_bet {
            return Err(ValidationError::BetTooSmall {
                min: self.min_bet_eth(),
            });
        }

        Ok(ValidGuess { number, value })
    }
}
