use crate::config::ChainSpec;
use crate::error::{GameError, Result};
use crate::types::{parse_address, parse_hex_u64};
use crate::wallet::{
    ProviderError, ProviderEvent, ProviderSubscription, WalletProvider, UNAUTHORIZED,
    UNRECOGNIZED_CHAIN,
};
use alloy_primitives::Address;
use serde_json::{json, Value};
use std::sync::Arc;

pub const CONNECT_FAILED: &str = "Failed to connect wallet. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected { account: Address, chain_id: u64 },
}

/// Flat view of a session; `account` is set iff `connected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub connected: bool,
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
}

/// What a provider event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    AccountSwitched(Address),
    Disconnected,
    /// The chain changed under us; all session state was dropped and the
    /// network should be checked again.
    Reloaded { chain_id: u64 },
    Ignored,
}

/// Mirrors what the wallet provider reports. It never assumes it can force
/// the wallet itself to disconnect, it only drops its own view of it.
pub struct WalletSession<P: WalletProvider + ?Sized> {
    provider: Arc<P>,
    chain: ChainSpec,
    state: SessionState,
    subscription: Option<ProviderSubscription>,
    last_error: Option<String>,
}

impl<P: WalletProvider + ?Sized> WalletSession<P> {
    pub fn new(provider: Arc<P>, chain: ChainSpec) -> Self {
        Self {
            provider,
            chain,
            state: SessionState::Disconnected,
            subscription: None,
            last_error: None,
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn chain(&self) -> &ChainSpec {
        &self.chain
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected { .. })
    }

    pub fn account(&self) -> Option<Address> {
        match self.state {
            SessionState::Connected { account, .. } => Some(account),
            _ => None,
        }
    }

    /// User-facing message from the last failed connect, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match self.state {
            SessionState::Connected { account, chain_id } => SessionSnapshot {
                connected: true,
                account: Some(account),
                chain_id: Some(chain_id),
            },
            _ => SessionSnapshot {
                connected: false,
                account: None,
                chain_id: None,
            },
        }
    }

    /// Returns a warning when the provider is on a different chain than the
    /// one the game is deployed on.
    pub async fn check_network(&self) -> Result<Option<String>> {
        let chain_id = read_chain_id(&*self.provider)
            .await
            .map_err(|e| GameError::session(format!("Failed to read chain ID: {}", e)))?;

        tracing::debug!("Current chain ID: {}", chain_id);
        if chain_id != self.chain.chain_id {
            return Ok(Some(format!(
                "Please connect to {} (Chain ID: {})",
                self.chain.chain_name, self.chain.chain_id
            )));
        }
        Ok(None)
    }

    pub async fn connect(&mut self) -> Result<Address> {
        if !matches!(self.state, SessionState::Disconnected) {
            return Err(GameError::session(
                "Wallet is already connected or connecting",
            ));
        }

        tracing::info!("Connecting wallet (chain {})", self.chain.chain_id);
        let attempt = ConnectAttempt::begin(&mut self.state);

        match establish(&*self.provider, &self.chain).await {
            Ok((account, chain_id)) => {
                // replace, never stack, event listeners
                if let Some(previous) = self.subscription.take() {
                    previous.cancel();
                }
                self.subscription = Some(self.provider.subscribe());
                attempt.finish(SessionState::Connected { account, chain_id });
                self.last_error = None;

                tracing::info!("Wallet connected: {} on chain {}", account, chain_id);
                Ok(account)
            }
            Err(e) => {
                tracing::error!("Error connecting wallet: {}", e);
                attempt.finish(SessionState::Disconnected);
                self.last_error = Some(CONNECT_FAILED.to_string());
                Err(GameError::session(format!("{} ({})", CONNECT_FAILED, e)))
            }
        }
    }

    /// Drops the local session and detaches from provider events.
    pub fn disconnect(&mut self) {
        self.reset("disconnect requested");
    }

    pub fn handle_event(&mut self, event: ProviderEvent) -> SessionChange {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                Some(&next) => match &mut self.state {
                    SessionState::Connected { account, .. } => {
                        *account = next;
                        tracing::info!("Active account switched to {}", next);
                        SessionChange::AccountSwitched(next)
                    }
                    _ => SessionChange::Ignored,
                },
                None => {
                    self.reset("wallet reported no accounts");
                    SessionChange::Disconnected
                }
            },
            ProviderEvent::ChainChanged(chain_id) => {
                self.reset("chain changed");
                SessionChange::Reloaded { chain_id }
            }
        }
    }

    /// Applies every event already queued by the provider.
    pub fn poll_events(&mut self) -> Vec<SessionChange> {
        let mut changes = Vec::new();
        while let Some(event) = self.subscription.as_mut().and_then(|s| s.try_next()) {
            changes.push(self.handle_event(event));
        }
        changes
    }

    /// Waits for the next provider event. `None` once detached.
    pub async fn next_change(&mut self) -> Option<SessionChange> {
        let event = self.subscription.as_mut()?.next().await?;
        Some(self.handle_event(event))
    }

    fn reset(&mut self, reason: &str) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        self.state = SessionState::Disconnected;
        self.last_error = None;
        tracing::info!("Wallet session reset: {}", reason);
    }
}

/// Puts the session back to `Disconnected` if a connect attempt is dropped
/// before it settles.
struct ConnectAttempt<'a> {
    state: &'a mut SessionState,
    settled: bool,
}

impl<'a> ConnectAttempt<'a> {
    fn begin(state: &'a mut SessionState) -> Self {
        *state = SessionState::Connecting;
        Self {
            state,
            settled: false,
        }
    }

    fn finish(mut self, next: SessionState) {
        *self.state = next;
        self.settled = true;
    }
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Wallet connect abandoned before it finished");
            *self.state = SessionState::Disconnected;
        }
    }
}

async fn establish<P: WalletProvider + ?Sized>(
    provider: &P,
    chain: &ChainSpec,
) -> std::result::Result<(Address, u64), ProviderError> {
    ensure_chain(provider, chain).await?;

    provider
        .request("wallet_requestPermissions", json!([{ "eth_accounts": {} }]))
        .await?;

    let accounts = provider.request("eth_requestAccounts", json!([])).await?;
    let account = parse_accounts(&accounts)?
        .first()
        .copied()
        .ok_or_else(|| ProviderError::new(UNAUTHORIZED, "wallet returned no accounts"))?;

    let chain_id = read_chain_id(provider).await?;
    Ok((account, chain_id))
}

async fn ensure_chain<P: WalletProvider + ?Sized>(
    provider: &P,
    chain: &ChainSpec,
) -> std::result::Result<(), ProviderError> {
    let chain_id = chain.hex_chain_id();
    let switched = provider
        .request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": chain_id }]),
        )
        .await;

    match switched {
        Ok(_) => Ok(()),
        Err(e) if e.code == Some(UNRECOGNIZED_CHAIN) => {
            tracing::info!("Adding {} to wallet", chain.chain_name);
            provider
                .request(
                    "wallet_addEthereumChain",
                    json!([{
                        "chainId": chain_id,
                        "chainName": chain.chain_name,
                        "nativeCurrency": {
                            "name": chain.currency_name,
                            "symbol": chain.currency_symbol,
                            "decimals": 18,
                        },
                        "rpcUrls": chain.rpc_urls,
                        "blockExplorerUrls": [],
                        "iconUrls": [],
                    }]),
                )
                .await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn read_chain_id<P: WalletProvider + ?Sized>(
    provider: &P,
) -> std::result::Result<u64, ProviderError> {
    let value = provider.request("eth_chainId", json!([])).await?;
    let raw = value
        .as_str()
        .ok_or_else(|| ProviderError::transport(format!("unexpected chain ID {}", value)))?;
    parse_hex_u64(raw).map_err(|e| ProviderError::transport(e.to_string()))
}

pub(crate) fn parse_accounts(value: &Value) -> std::result::Result<Vec<Address>, ProviderError> {
    let list = value
        .as_array()
        .ok_or_else(|| ProviderError::transport(format!("unexpected account list {}", value)))?;

    list.iter()
        .map(|entry| {
            entry
                .as_str()
                .ok_or_else(|| ProviderError::transport(format!("unexpected account {}", entry)))
                .and_then(|raw| {
                    parse_address(raw).map_err(|e| ProviderError::transport(e.to_string()))
                })
        })
        .collect()
}
