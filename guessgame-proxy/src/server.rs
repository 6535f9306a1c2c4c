use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use guessgame_core::{
    lookup_status, ErrorBody, GameConfig, GameError, GuessContract, JsonRpcClient, StatusResponse,
    StatusSource,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    source: Option<Arc<dyn StatusSource>>,
}

impl AppState {
    pub fn new(source: Option<Arc<dyn StatusSource>>) -> Self {
        Self { source }
    }

    /// Reads straight from the contract. Without a contract address the
    /// proxy still serves, answering every lookup with an error.
    pub fn from_config(config: &GameConfig) -> guessgame_core::Result<Self> {
        let source = match config.contract()? {
            Some(address) => {
                let rpc = Arc::new(JsonRpcClient::new(config.rpc_url.clone()));
                Some(Arc::new(GuessContract::new(rpc, address)) as Arc<dyn StatusSource>)
            }
            None => None,
        };
        Ok(Self::new(source))
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_some()
    }
}

pub enum ProxyError {
    NotConfigured,
    Lookup(GameError),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match self {
            ProxyError::NotConfigured => ErrorBody::new("Contract address not configured"),
            ProxyError::Lookup(err) => ErrorBody::new("Failed to fetch game status")
                .with_details(err.to_string())
                .with_code(err.code()),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status/:address", get(get_status))
        .route("/api/game/status/:address", get(get_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<StatusResponse>, ProxyError> {
    let source = state.source.as_ref().ok_or_else(|| {
        tracing::error!("Status requested for {} but no contract is configured", address);
        ProxyError::NotConfigured
    })?;

    let guess = lookup_status(source.as_ref(), &address)
        .await
        .map_err(|e| {
            tracing::error!("Error fetching game status for {}: {}", address, e);
            ProxyError::Lookup(e)
        })?;

    tracing::debug!("Status for {}: {:?}", address, guess);
    Ok(Json(StatusResponse { guess }))
}
