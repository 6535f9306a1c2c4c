//! Wallet provider backed by a JSON-RPC node with unlocked accounts, such as
//! a local development node.

use crate::rpc::JsonRpcClient;
use crate::types::parse_hex_u64;
use crate::wallet::session::parse_accounts;
use crate::wallet::{
    ProviderError, ProviderEvent, ProviderSubscription, WalletProvider, CHAIN_DISCONNECTED,
};
use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// EIP-1193: the provider does not support the method.
pub const UNSUPPORTED_METHOD: i64 = 4200;
/// JSON-RPC: invalid method parameters.
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Clone)]
pub struct RpcWalletProvider {
    rpc: Arc<JsonRpcClient>,
    account: Option<Address>,
    poll_interval: Duration,
}

impl RpcWalletProvider {
    pub fn new(rpc: Arc<JsonRpcClient>) -> Self {
        Self {
            rpc,
            account: None,
            poll_interval: Duration::from_secs(2),
        }
    }

    /// Only expose `account`, the way a wallet exposes the account the user
    /// selected.
    pub fn with_account(mut self, account: Address) -> Self {
        self.account = Some(account);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let value: Value = self.rpc.call("eth_accounts", json!([])).await?;
        let accounts = parse_accounts(&value)?;
        Ok(select_accounts(accounts, self.account))
    }

    pub async fn chain_id(&self) -> Result<u64, ProviderError> {
        let value: String = self.rpc.call("eth_chainId", json!([])).await?;
        parse_hex_u64(&value).map_err(|e| ProviderError::transport(e.to_string()))
    }

    async fn switch_chain(&self, params: &Value) -> Result<Value, ProviderError> {
        let wanted = params
            .get(0)
            .and_then(|p| p.get("chainId"))
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::new(INVALID_PARAMS, "missing chainId"))?;
        let wanted =
            parse_hex_u64(wanted).map_err(|e| ProviderError::new(INVALID_PARAMS, e.to_string()))?;

        let current = self.chain_id().await?;
        if current != wanted {
            return Err(ProviderError::new(
                CHAIN_DISCONNECTED,
                format!(
                    "node at {} serves chain {}, not {}",
                    self.rpc.url(),
                    current,
                    wanted
                ),
            ));
        }
        Ok(Value::Null)
    }

    async fn watch(self, events: mpsc::UnboundedSender<ProviderEvent>) {
        let mut accounts = self.accounts().await.ok();
        let mut chain_id = self.chain_id().await.ok();

        let mut ticker = tokio::time::interval(self.poll_interval);
        // first tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match self.accounts().await {
                Ok(latest) => {
                    if accounts.as_ref().is_some_and(|known| *known != latest)
                        && events
                            .send(ProviderEvent::AccountsChanged(latest.clone()))
                            .is_err()
                    {
                        break;
                    }
                    accounts = Some(latest);
                }
                Err(e) => tracing::warn!("Account poll failed: {}", e),
            }

            match self.chain_id().await {
                Ok(latest) => {
                    if chain_id.is_some_and(|known| known != latest)
                        && events.send(ProviderEvent::ChainChanged(latest)).is_err()
                    {
                        break;
                    }
                    chain_id = Some(latest);
                }
                Err(e) => tracing::warn!("Chain poll failed: {}", e),
            }
        }

        tracing::debug!("Provider watcher for {} stopped", self.rpc.url());
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        match method {
            "eth_requestAccounts" | "eth_accounts" => {
                let accounts = self.accounts().await?;
                Ok(Value::Array(
                    accounts
                        .iter()
                        .map(|a| Value::String(a.to_checksum(None)))
                        .collect(),
                ))
            }
            // node accounts are unlocked, nothing to grant
            "wallet_requestPermissions" => Ok(json!([{ "parentCapability": "eth_accounts" }])),
            "wallet_switchEthereumChain" => self.switch_chain(&params).await,
            "wallet_addEthereumChain" => Err(ProviderError::new(
                UNSUPPORTED_METHOD,
                "a JSON-RPC node cannot add chains",
            )),
            _ => Ok(self.rpc.call::<Value>(method, params).await?),
        }
    }

    fn subscribe(&self) -> ProviderSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.clone().watch(tx));
        ProviderSubscription::new(rx, move || handle.abort())
    }
}

fn select_accounts(accounts: Vec<Address>, selected: Option<Address>) -> Vec<Address> {
    match selected {
        Some(selected) => accounts.into_iter().filter(|a| *a == selected).collect(),
        None => accounts,
    }
}
