use crate::error::{GameError, Result};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Snapshot of the contract's `guesses(address)` slot for one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessRecord {
    pub player: Address,
    pub amount: U256,
    pub guessed_number: U256,
    pub has_guessed: bool,
}

impl GuessRecord {
    /// Record the contract returns for an address that never guessed.
    pub fn empty() -> Self {
        Self {
            player: Address::ZERO,
            amount: U256::ZERO,
            guessed_number: U256::ZERO,
            has_guessed: false,
        }
    }
}

/// JSON shape of a guess record. Integers travel as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessView {
    pub player: String,
    pub amount: String,
    pub guessed_number: String,
    pub has_guessed: bool,
}

impl From<&GuessRecord> for GuessView {
    fn from(record: &GuessRecord) -> Self {
        Self {
            player: record.player.to_checksum(None),
            amount: record.amount.to_string(),
            guessed_number: record.guessed_number.to_string(),
            has_guessed: record.has_guessed,
        }
    }
}

impl TryFrom<GuessView> for GuessRecord {
    type Error = GameError;

    fn try_from(view: GuessView) -> Result<Self> {
        Ok(Self {
            player: parse_address(&view.player)?,
            amount: parse_decimal_u256(&view.amount)?,
            guessed_number: parse_decimal_u256(&view.guessed_number)?,
            has_guessed: view.has_guessed,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub guess: GuessView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            code: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }
}

/// Parses a `0x`-prefixed 20-byte hex address.
///
/// All-lowercase and all-uppercase input is accepted as-is. Mixed case is
/// treated as an EIP-55 checksum and must verify.
pub fn parse_address(raw: &str) -> Result<Address> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| GameError::InvalidAddress(format!("'{}' is missing the 0x prefix", raw)))?;

    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GameError::InvalidAddress(format!(
            "'{}' is not 20 bytes of hex",
            raw
        )));
    }

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(format!("0x{}", digits), None)
            .map_err(|e| GameError::InvalidAddress(format!("bad checksum for '{}': {}", raw, e)));
    }

    let bytes = hex::decode(digits)
        .map_err(|e| GameError::InvalidAddress(format!("'{}': {}", raw, e)))?;
    Ok(Address::from_slice(&bytes))
}

pub(crate) fn parse_decimal_u256(raw: &str) -> Result<U256> {
    U256::from_str_radix(raw, 10)
        .map_err(|e| GameError::decode(format!("'{}' is not a decimal integer: {}", raw, e)))
}

pub(crate) fn parse_hex_u64(raw: &str) -> Result<u64> {
    let digits = raw.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16)
        .map_err(|e| GameError::decode(format!("'{}' is not a hex quantity: {}", raw, e)))
}
