//! In-memory fakes shared by the unit tests.

use crate::error::{GameError, Result};
use crate::status::StatusSource;
use crate::types::GuessRecord;
use crate::wallet::{
    ProviderError, ProviderEvent, ProviderSubscription, WalletProvider, UNRECOGNIZED_CHAIN,
    USER_REJECTED,
};
use alloy_primitives::Address;
use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

pub const FAKE_TX_HASH: &str =
    "0xabababababababababababababababababababababababababababababababab";

struct FakeState {
    accounts: Vec<Address>,
    chain_id: u64,
    knows_chain: bool,
    reject_connect: bool,
    send_error: Option<ProviderError>,
    gate: Option<(String, Arc<Notify>)>,
    calls: Vec<(String, Value)>,
    senders: Vec<mpsc::UnboundedSender<ProviderEvent>>,
}

pub struct FakeProvider {
    state: Mutex<FakeState>,
    subscribed: AtomicUsize,
    cancels: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                accounts,
                chain_id: 31337,
                knows_chain: true,
                reject_connect: false,
                send_error: None,
                gate: None,
                calls: Vec::new(),
                senders: Vec::new(),
            }),
            subscribed: AtomicUsize::new(0),
            cancels: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn reject_connect(&self) {
        self.state.lock().reject_connect = true;
    }

    pub fn forget_chain(&self) {
        self.state.lock().knows_chain = false;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().chain_id = chain_id;
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().accounts = accounts;
    }

    pub fn fail_send(&self, error: ProviderError) {
        self.state.lock().send_error = Some(error);
    }

    /// Holds every `method` call until [`FakeProvider::release`].
    pub fn gate(&self, method: &str) {
        self.state.lock().gate = Some((method.to_string(), Arc::new(Notify::new())));
    }

    pub fn release(&self) {
        if let Some((_, gate)) = &self.state.lock().gate {
            gate.notify_one();
        }
    }

    /// Lets later calls through; callers already parked stay parked.
    pub fn ungate(&self) {
        self.state.lock().gate = None;
    }

    pub fn emit(&self, event: ProviderEvent) {
        let state = self.state.lock();
        for sender in &state.senders {
            let _ = sender.send(event.clone());
        }
    }

    pub fn methods(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    pub fn params_of(&self, method: &str) -> Option<Value> {
        self.state
            .lock()
            .calls
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
    }

    pub fn sent_transactions(&self) -> usize {
        self.methods()
            .iter()
            .filter(|m| *m == "eth_sendTransaction")
            .count()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn live_subscriptions(&self) -> usize {
        self.subscribed.load(Ordering::SeqCst) - self.cancel_count()
    }
}

#[async_trait]
impl WalletProvider for FakeProvider {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError> {
        let gate = {
            let mut state = self.state.lock();
            state.calls.push((method.to_string(), params));
            state
                .gate
                .as_ref()
                .filter(|(gated, _)| gated == method)
                .map(|(_, notify)| notify.clone())
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock();
        match method {
            "wallet_switchEthereumChain" if !state.knows_chain => Err(ProviderError::new(
                UNRECOGNIZED_CHAIN,
                "Unrecognized chain ID \"0x7a69\"",
            )),
            "wallet_switchEthereumChain" => Ok(Value::Null),
            "wallet_addEthereumChain" => {
                state.knows_chain = true;
                Ok(Value::Null)
            }
            "wallet_requestPermissions" if state.reject_connect => Err(ProviderError::new(
                USER_REJECTED,
                "User rejected the request.",
            )),
            "wallet_requestPermissions" => Ok(json!([])),
            "eth_requestAccounts" | "eth_accounts" => {
                let accounts: Vec<String> =
                    state.accounts.iter().map(|a| a.to_checksum(None)).collect();
                Ok(json!(accounts))
            }
            "eth_chainId" => Ok(json!(format!("{:#x}", state.chain_id))),
            "eth_sendTransaction" => match state.send_error.clone() {
                Some(error) => Err(error),
                None => Ok(json!(FAKE_TX_HASH)),
            },
            _ => Err(ProviderError::new(4200, format!("{} not supported", method))),
        }
    }

    fn subscribe(&self) -> ProviderSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().senders.push(tx);
        self.subscribed.fetch_add(1, Ordering::SeqCst);

        let cancels = self.cancels.clone();
        ProviderSubscription::new(rx, move || {
            cancels.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// Status source answering from a fixed record or error.
pub struct FakeStatus {
    reply: Mutex<std::result::Result<GuessRecord, String>>,
    calls: AtomicUsize,
}

impl FakeStatus {
    pub fn new(has_guessed: bool) -> Self {
        let mut record = GuessRecord::empty();
        record.has_guessed = has_guessed;
        Self {
            reply: Mutex::new(Ok(record)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Mutex::new(Err(message.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for FakeStatus {
    async fn fetch_status(&self, player: Address) -> Result<GuessRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.reply.lock() {
            Ok(record) => {
                let mut record = record.clone();
                if record.has_guessed {
                    record.player = player;
                }
                Ok(record)
            }
            Err(message) => Err(GameError::status_query(message.clone())),
        }
    }
}

/// Serves `app` on an ephemeral localhost port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

struct NodeState {
    accounts: Vec<Address>,
    chain_id: u64,
    call_result: String,
    calls: Vec<(String, Value)>,
}

/// JSON-RPC node answering `eth_accounts`, `eth_chainId` and `eth_call`.
/// `POST /down` answers 502 with an empty body.
#[derive(Clone)]
pub struct MockNode {
    state: Arc<Mutex<NodeState>>,
}

impl MockNode {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            state: Arc::new(Mutex::new(NodeState {
                accounts,
                chain_id: 31337,
                call_result: "0x".to_string(),
                calls: Vec::new(),
            })),
        }
    }

    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/", post(answer_rpc))
            .route("/down", post(|| async { StatusCode::BAD_GATEWAY }))
            .with_state(self.clone());
        serve(app).await
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().accounts = accounts;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().chain_id = chain_id;
    }

    pub fn set_call_result(&self, result: impl Into<String>) {
        self.state.lock().call_result = result.into();
    }

    pub fn count(&self, method: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    pub fn params_of(&self, method: &str) -> Option<Value> {
        self.state
            .lock()
            .calls
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
    }

    /// Waits until the node has answered `method` at least `times` times.
    pub async fn wait_for(&self, method: &str, times: usize) {
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while self.count(method) < times {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }
}

async fn answer_rpc(State(node): State<MockNode>, Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default().to_string();

    let mut state = node.state.lock();
    state.calls.push((method.clone(), request["params"].clone()));

    let result = match method.as_str() {
        "eth_accounts" => json!(state
            .accounts
            .iter()
            .map(|a| a.to_checksum(None))
            .collect::<Vec<_>>()),
        "eth_chainId" => json!(format!("{:#x}", state.chain_id)),
        "eth_call" => json!(state.call_result),
        _ => {
            return Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": format!("method {} not found", method) },
            }))
        }
    };

    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}
