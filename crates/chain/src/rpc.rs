//! JSON-RPC plumbing for node-backed clients.

use crate::error::{ChainError, ChainResult};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A JSON-RPC 2.0 endpoint with a bounded per-call timeout.
pub struct RpcEndpoint {
    url: String,
    client: reqwest::Client,
    timeout_secs: u64,
    next_id: AtomicU64,
}

impl RpcEndpoint {
    pub fn new(url: String, timeout_secs: u64) -> ChainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ChainError::Connect {
                endpoint: url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            url,
            client,
            timeout_secs,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one call and returns the `result` member. An `error`
    /// member in the body is fatal; transport failures and non-success
    /// HTTP statuses are transient.
    pub async fn call(&self, method: &str, params: Value) -> ChainResult<Value> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::Connect {
                endpoint: self.url.clone(),
                reason: format!("http status {}", status),
            });
        }

        let json: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ChainError::Timeout {
                    endpoint: self.url.clone(),
                    seconds: self.timeout_secs,
                }
            } else {
                ChainError::MalformedResponse(format!("invalid json-rpc body: {}", e))
            }
        })?;

        if let Some(error) = json.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown rpc error")
                .to_string();
            return Err(ChainError::Rpc { code, message });
        }

        match json.get("result") {
            Some(result) => Ok(result.clone()),
            None => Err(ChainError::MalformedResponse(
                "json-rpc response carries neither result nor error".to_string(),
            )),
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ChainError {
        if err.is_timeout() {
            ChainError::Timeout {
                endpoint: self.url.clone(),
                seconds: self.timeout_secs,
            }
        } else {
            ChainError::Connect {
                endpoint: self.url.clone(),
                reason: err.to_string(),
            }
        }
    }
}
