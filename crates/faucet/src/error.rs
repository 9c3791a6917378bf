//! Error types for the faucet service.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use koin_chain::ChainError;
use serde_json::json;
use thiserror::Error;

/// Faucet service errors. Every variant renders as the wire shape
/// `{"message": "..."}` with the status clients key on; detail stays in
/// the logs.
#[derive(Debug, Error)]
pub enum FaucetError {
    #[error("input error")]
    Input,

    #[error("invalid address format")]
    AddressFormat,

    #[error("throttled for {retry_after_secs} more seconds")]
    Throttled { retry_after_secs: u64 },

    #[error("chain backend error: {0}")]
    Chain(#[from] ChainError),

    #[error("store error: {0}")]
    Store(#[from] sled::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for FaucetError {
    fn into_response(self) -> Response {
        match self {
            FaucetError::Input => reply(StatusCode::BAD_REQUEST, "Input error.".to_string()),
            FaucetError::AddressFormat => {
                reply(StatusCode::BAD_REQUEST, "Invalid address format.".to_string())
            }
            FaucetError::Throttled { retry_after_secs } => (
                StatusCode::NOT_ACCEPTABLE,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                Json(json!({
                    "message": format!(
                        "Cannot receive funds for {} more seconds.",
                        retry_after_secs
                    )
                })),
            )
                .into_response(),
            FaucetError::Chain(_) => reply(StatusCode::BAD_GATEWAY, "Backend error.".to_string()),
            FaucetError::Store(_) | FaucetError::Internal(_) => {
                reply(StatusCode::INTERNAL_SERVER_ERROR, "Internal error.".to_string())
            }
        }
    }
}

fn reply(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

pub type FaucetResult<T> = Result<T, FaucetError>;
