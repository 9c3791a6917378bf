//! HTTP API for the faucet service.
//!
//! The router is exported so integration tests can drive it with
//! `tower::ServiceExt::oneshot` without binding a socket.

use crate::dispatch::Dispatcher;
use crate::error::{FaucetError, FaucetResult};
use crate::metrics::FaucetMetrics;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use koin_chain::TokenInfo;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Shared state handed to every handler.
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub token: TokenInfo,
    pub metrics: Arc<FaucetMetrics>,
}

/// Payout request body.
#[derive(Debug, Deserialize)]
pub struct RequestKoin {
    pub id: String,
    pub address: String,
}

/// Balance query body.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub address: String,
}

/// Build the service router.
pub fn router(state: Arc<AppState>, metrics_enabled: bool) -> Router {
    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/request_koin", post(request_koin_handler))
        .route("/balance", post(balance_handler));

    if metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router.with_state(state)
}

/// Bodies are decoded by hand: malformed JSON and missing fields are both
/// input errors, not framework 422s.
fn decode<T: DeserializeOwned>(body: &Bytes) -> FaucetResult<T> {
    serde_json::from_slice(body).map_err(|_| FaucetError::Input)
}

async fn request_koin_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> FaucetResult<Response> {
    let request: RequestKoin = decode(&body)?;

    let payout = state
        .dispatcher
        .dispense(&request.id, &request.address)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": format!(
                "Transferring {} {} to address {}.",
                state.token.format_minor(payout.amount_minor),
                state.token.symbol,
                payout.to
            )
        })),
    )
        .into_response())
}

async fn balance_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> FaucetResult<Response> {
    let query: BalanceQuery = decode(&body)?;

    let balance = state.dispatcher.balance_of(&query.address).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": format!(
                "Balance at address {} is {} {}.",
                query.address,
                state.token.format_minor(balance),
                state.token.symbol
            )
        })),
    )
        .into_response())
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "name": "koin-faucet",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/health", "/status", "/request_koin", "/balance", "/metrics"],
    }))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn status_handler(State(state): State<Arc<AppState>>) -> FaucetResult<Response> {
    let wallet = state.dispatcher.wallet_status().await?;

    Ok(Json(json!({
        "wallet_address": wallet.address,
        "balance": state.token.format_minor(wallet.balance_minor),
        "symbol": state.token.symbol,
    }))
    .into_response())
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.gather() {
        Ok(text) => text.into_response(),
        Err(err) => {
            warn!(error = %err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_well_formed_bodies() {
        let body = Bytes::from(r#"{"id": "alice", "address": "addr"}"#);
        let request: RequestKoin = decode(&body).unwrap();
        assert_eq!(request.id, "alice");
        assert_eq!(request.address, "addr");
    }

    #[test]
    fn decode_maps_garbage_to_input_error() {
        let cases = ["", "not json", "{}", r#"{"id": "alice"}"#, "[1, 2]"];
        for case in cases {
            let result: FaucetResult<RequestKoin> = decode(&Bytes::from(case));
            assert!(
                matches!(result, Err(FaucetError::Input)),
                "body {:?} should be an input error",
                case
            );
        }
    }
}
