use crate::error::{GameError, Result};
use crate::types::parse_address;
use crate::units::parse_ether;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest guess the contract accepts.
pub const MIN_GUESS: u64 = 1;
/// Largest guess the contract accepts.
pub const MAX_GUESS: u64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub contract_address: Option<String>,
    pub rpc_url: String,
    pub proxy_url: String,
    pub chain: ChainSpec,
    pub min_bet_eth: String,
}

/// Chain the wallet is expected to be on, with the parameters needed to add
/// it to a wallet that does not know it yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSpec {
    pub chain_id: u64,
    pub chain_name: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub rpc_urls: Vec<String>,
}

impl ChainSpec {
    pub fn hex_chain_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self {
            chain_id: 31337,
            chain_name: "Hardhat Network".to_string(),
            currency_name: "Hardhat Ether".to_string(),
            currency_symbol: "hETH".to_string(),
            rpc_urls: vec!["http://127.0.0.1:8545/".to_string()],
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            contract_address: None,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            proxy_url: "http://localhost:3001".to_string(),
            chain: ChainSpec::default(),
            min_bet_eth: "0.01".to_string(),
        }
    }
}

impl GameConfig {
    /// Defaults overridden by the process environment (after loading `.env`).
    pub fn from_env() -> Result<Self> {
        // a missing .env is fine
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Reads a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(address) = std::env::var("CONTRACT_ADDRESS") {
            if !address.trim().is_empty() {
                self.contract_address = Some(address);
            }
        }
        if let Ok(url) = std::env::var("ETHEREUM_NODE_URL") {
            self.rpc_url = url;
        }
        if let Ok(url) = std::env::var("BACKEND_URL") {
            self.proxy_url = url;
        }
        if let Ok(chain_id) = std::env::var("CHAIN_ID") {
            self.chain.chain_id = chain_id
                .parse()
                .map_err(|e| GameError::config(format!("Invalid CHAIN_ID '{}': {}", chain_id, e)))?;
        }
        if let Ok(min_bet) = std::env::var("MIN_BET_ETH") {
            self.min_bet_eth = min_bet;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            return Err(GameError::config("Ethereum node URL cannot be empty"));
        }

        if self.proxy_url.is_empty() {
            return Err(GameError::config("Proxy URL cannot be empty"));
        }

        if self.chain.chain_id == 0 {
            return Err(GameError::config("Chain ID must be greater than 0"));
        }

        if let Some(address) = &self.contract_address {
            parse_address(address)
                .map_err(|e| GameError::config(format!("Invalid contract address: {}", e)))?;
        }

        if self.min_bet()?.is_zero() {
            return Err(GameError::config("Minimum bet must be greater than 0"));
        }

        Ok(())
    }

    pub fn contract(&self) -> Result<Option<Address>> {
        self.contract_address
            .as_deref()
            .map(parse_address)
            .transpose()
    }

    pub fn require_contract(&self) -> Result<Address> {
        self.contract()?
            .ok_or_else(|| GameError::config("Contract address not configured"))
    }

    pub fn min_bet(&self) -> Result<U256> {
        parse_ether(&self.min_bet_eth)
            .map_err(|e| GameError::config(format!("Invalid minimum bet: {}", e)))
    }
}
