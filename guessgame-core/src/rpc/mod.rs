//! Minimal JSON-RPC 2.0 client over HTTP.

use crate::error::{GameError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        tracing::debug!("rpc -> {} #{} {}", method, id, request.params);

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                GameError::network_connection(format!("{} unreachable: {}", self.url, e))
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() && body.trim().is_empty() {
            return Err(GameError::network_connection(format!(
                "{} answered HTTP {}",
                self.url, status
            )));
        }

        let value = parse_response(&body)?;
        tracing::debug!("rpc <- {} #{} {}", method, id, value);
        Ok(serde_json::from_value(value)?)
    }
}

/// Extracts `result` from a JSON-RPC reply, turning an `error` object into
/// [`GameError::Rpc`].
pub(crate) fn parse_response(body: &str) -> Result<Value> {
    let response: RpcResponse = serde_json::from_str(body)
        .map_err(|e| GameError::decode(format!("invalid JSON-RPC reply: {}", e)))?;

    if let Some(error) = response.error {
        return Err(GameError::Rpc {
            code: error.code,
            message: error.message,
            data: error.data.map(|d| match d {
                Value::String(s) => s,
                other => other.to_string(),
            }),
        });
    }

    Ok(response.result.unwrap_or(Value::Null))
}
