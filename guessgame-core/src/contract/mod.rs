//! Bindings for the guessing game contract.

use crate::error::{GameError, Result};
use crate::rpc::JsonRpcClient;
use crate::status::StatusSource;
use crate::types::GuessRecord;
use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

sol! {
    function guesses(address account) external view returns (address player, uint256 amount, uint256 guessedNumber, bool hasGuessed);
    function makeGuess(uint256 _number) external payable;
}

/// Revert reason emitted when the player already holds a guess this round.
pub const REVERT_ALREADY_GUESSED: &str = "Already guessed";
/// Revert reason emitted when `msg.value` is below the minimum bet.
pub const REVERT_MINIMUM_BET: &str = "Minimum bet not met";

pub fn guesses_calldata(player: Address) -> Vec<u8> {
    guessesCall { account: player }.abi_encode()
}

pub fn make_guess_calldata(number: u64) -> Vec<u8> {
    makeGuessCall {
        _number: U256::from(number),
    }
    .abi_encode()
}

/// Decodes the hex return data of `guesses(address)`.
pub fn decode_guess_reply(reply: &str) -> Result<GuessRecord> {
    let bytes = hex::decode(reply.trim_start_matches("0x"))
        .map_err(|e| GameError::decode(format!("reply is not hex: {}", e)))?;

    if bytes.is_empty() {
        return Err(GameError::decode(
            "empty reply, is the contract deployed at this address?",
        ));
    }

    let decoded = guessesCall::abi_decode_returns(&bytes, true)
        .map_err(|e| GameError::decode(format!("cannot decode guesses() reply: {}", e)))?;

    Ok(GuessRecord {
        player: decoded.player,
        amount: decoded.amount,
        guessed_number: decoded.guessedNumber,
        has_guessed: decoded.hasGuessed,
    })
}

/// Read-only handle on a deployed game contract.
pub struct GuessContract {
    rpc: Arc<JsonRpcClient>,
    address: Address,
}

impl GuessContract {
    pub fn new(rpc: Arc<JsonRpcClient>, address: Address) -> Self {
        Self { rpc, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn fetch_guess(&self, player: Address) -> Result<GuessRecord> {
        let data = guesses_calldata(player);
        let params = json!([
            {
                "to": self.address.to_checksum(None),
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest"
        ]);

        let reply: String = self.rpc.call("eth_call", params).await?;
        decode_guess_reply(&reply)
    }
}

#[async_trait]
impl StatusSource for GuessContract {
    async fn fetch_status(&self, player: Address) -> Result<GuessRecord> {
        self.fetch_guess(player).await
    }
}
