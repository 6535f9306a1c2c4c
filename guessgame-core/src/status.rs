use crate::error::{GameError, Result};
use crate::types::{parse_address, ErrorBody, GuessRecord, GuessView, StatusResponse};
use alloy_primitives::Address;
use async_trait::async_trait;

/// Anything that can answer "what is this player's current guess".
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, player: Address) -> Result<GuessRecord>;
}

/// Normalizes `raw_address` and asks `source` for that player's guess.
pub async fn lookup_status<S: StatusSource + ?Sized>(
    source: &S,
    raw_address: &str,
) -> Result<GuessView> {
    let player = parse_address(raw_address)?;
    let record = source.fetch_status(player).await?;
    Ok(GuessView::from(&record))
}

/// HTTP client for the status proxy.
pub struct StatusClient {
    http: reqwest::Client,
    base_url: String,
}

impl StatusClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn status_url(&self, player: Address) -> String {
        format!("{}/api/status/{}", self.base_url, player.to_checksum(None))
    }
}

#[async_trait]
impl StatusSource for StatusClient {
    async fn fetch_status(&self, player: Address) -> Result<GuessRecord> {
        let url = self.status_url(player);
        tracing::debug!("Checking game status at {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| GameError::status_query(format!("proxy unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GameError::status_query(format!("failed to read reply: {}", e)))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => match err.details {
                    Some(details) => format!("{}: {}", err.error, details),
                    None => err.error,
                },
                Err(_) => format!("proxy answered HTTP {}", status),
            };
            return Err(GameError::status_query(message));
        }

        let reply: StatusResponse = serde_json::from_str(&body)
            .map_err(|e| GameError::status_query(format!("unexpected reply: {}", e)))?;
        GuessRecord::try_from(reply.guess)
    }
}
