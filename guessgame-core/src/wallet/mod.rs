//! Wallet provider capability and the session built on top of it.

pub mod rpc_provider;
pub mod session;

pub use rpc_provider::RpcWalletProvider;
pub use session::{SessionChange, SessionSnapshot, SessionState, WalletSession};

use crate::error::GameError;
use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// EIP-1193: user rejected the request.
pub const USER_REJECTED: i64 = 4001;
/// EIP-1193: provider is disconnected from all chains.
pub const DISCONNECTED: i64 = 4900;
/// EIP-1193: the requested method or account is not authorized.
pub const UNAUTHORIZED: i64 = 4100;
/// EIP-1193: provider is not connected to the requested chain.
pub const CHAIN_DISCONNECTED: i64 = 4901;
/// EIP-3326: chain is unknown to the wallet and must be added first.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
    pub data: Option<Value>,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
            data: None,
        }
    }

    /// Failure below the provider protocol, e.g. the transport.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(USER_REJECTED)
    }
}

impl From<GameError> for ProviderError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::Rpc {
                code,
                message,
                data,
            } => {
                // revert reasons usually sit in `data`, keep them searchable
                let message = match &data {
                    Some(data) if !message.contains(data.as_str()) => {
                        format!("{} ({})", message, data)
                    }
                    _ => message,
                };
                Self {
                    code: Some(code),
                    message,
                    data: data.map(Value::String),
                }
            }
            GameError::NetworkConnection(message) => Self::new(DISCONNECTED, message),
            other => Self::transport(other.to_string()),
        }
    }
}

/// Notifications a wallet pushes without being asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// Live event feed from a provider.
///
/// The cancel hook runs exactly once, on [`ProviderSubscription::cancel`] or
/// on drop, whichever comes first.
pub struct ProviderSubscription {
    events: mpsc::UnboundedReceiver<ProviderEvent>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl ProviderSubscription {
    pub fn new(
        events: mpsc::UnboundedReceiver<ProviderEvent>,
        cancel: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub async fn next(&mut self) -> Option<ProviderEvent> {
        self.events.recv().await
    }

    pub fn try_next(&mut self) -> Option<ProviderEvent> {
        self.events.try_recv().ok()
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            self.events.close();
            cancel();
        }
    }
}

impl Drop for ProviderSubscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for ProviderSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Injected wallet capability, shaped after EIP-1193.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    fn subscribe(&self) -> ProviderSubscription;
}
