//! Exact conversion between decimal ETH strings and wei.

use crate::error::{GameError, Result};
use alloy_primitives::U256;

pub const ETHER_DECIMALS: usize = 18;

/// Parses a decimal ETH amount into wei without rounding.
///
/// Accepts `1`, `0.01`, `.5` and `2.`; rejects signs, exponents, empty input
/// and anything finer than one wei.
pub fn parse_ether(raw: &str) -> Result<U256> {
    let text = raw.trim();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(GameError::InvalidAmount(format!(
            "'{}' is not a decimal ETH amount",
            raw
        )));
    }

    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(GameError::InvalidAmount(format!(
            "'{}' is not a decimal ETH amount",
            raw
        )));
    }

    if fraction.len() > ETHER_DECIMALS {
        return Err(GameError::InvalidAmount(format!(
            "'{}' has more than {} decimal places and cannot be expressed in wei",
            raw, ETHER_DECIMALS
        )));
    }

    let digits = format!(
        "{}{}{}",
        whole,
        fraction,
        "0".repeat(ETHER_DECIMALS - fraction.len())
    );

    U256::from_str_radix(&digits, 10)
        .map_err(|e| GameError::InvalidAmount(format!("'{}' is out of range: {}", raw, e)))
}

/// Formats wei as a decimal ETH string with trailing zeros trimmed.
pub fn format_ether(wei: U256) -> String {
    let digits = wei.to_string();
    let padded = if digits.len() <= ETHER_DECIMALS {
        format!("{:0>width$}", digits, width = ETHER_DECIMALS + 1)
    } else {
        digits
    };

    let (whole, fraction) = padded.split_at(padded.len() - ETHER_DECIMALS);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}
