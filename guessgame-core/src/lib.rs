//! Client-side core of the number guessing game.
//!
//! Reads a player's guess from the game contract, keeps a wallet session in
//! sync with an EIP-1193 style provider and drives the payable `makeGuess`
//! submission.

pub mod config;
pub mod contract;
pub mod error;
pub mod game;
pub mod rpc;
pub mod status;
pub mod types;
pub mod units;
pub mod wallet;

#[cfg(test)]
mod test_support;

pub use config::{ChainSpec, GameConfig, MAX_GUESS, MIN_GUESS};
pub use contract::GuessContract;
pub use error::{GameError, Result};
pub use game::{
    GuessForm, GuessRules, GuessSubmitter, SubmissionError, SubmissionReceipt, SubmissionState,
};
pub use rpc::JsonRpcClient;
pub use status::{lookup_status, StatusClient, StatusSource};
pub use types::{parse_address, ErrorBody, GuessRecord, GuessView, StatusResponse};
pub use units::{format_ether, parse_ether};
pub use wallet::{
    ProviderError, ProviderEvent, RpcWalletProvider, SessionChange, WalletProvider, WalletSession,
};

pub use alloy_primitives::{Address, U256};
