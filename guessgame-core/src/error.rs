use crate::game::SubmissionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<String>,
    },

    #[error("Network connection error: {0}")]
    NetworkConnection(String),

    #[error("Malformed contract reply: {0}")]
    Decode(String),

    #[error("Status query failed: {0}")]
    StatusQuery(String),

    #[error("Wallet session error: {0}")]
    Session(String),

    #[error("{0}")]
    Submission(#[from] SubmissionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Dialog error: {0}")]
    Dialog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GameError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn dialog(msg: impl Into<String>) -> Self {
        Self::Dialog(msg.into())
    }

    pub fn network_connection(msg: impl Into<String>) -> Self {
        Self::NetworkConnection(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    pub fn status_query(msg: impl Into<String>) -> Self {
        Self::StatusQuery(msg.into())
    }

    /// Short machine-readable code for diagnostics, when one exists.
    pub fn code(&self) -> Option<String> {
        match self {
            Self::Rpc { code, .. } => Some(code.to_string()),
            Self::InvalidAddress(_) => Some("INVALID_ARGUMENT".to_string()),
            Self::NetworkConnection(_) => Some("NETWORK_ERROR".to_string()),
            Self::Decode(_) => Some("BAD_DATA".to_string()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GameError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GameError::Decode(err.to_string())
        } else {
            GameError::NetworkConnection(err.to_string())
        }
    }
}
