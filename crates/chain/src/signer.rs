//! Node-backed client with an external signing step.
//!
//! Reads go straight to the node over JSON-RPC. Transfers assemble an
//! unsigned payload, hand it to a local signing executable over
//! stdin/stdout, then submit the signed result. Keys never enter this
//! process.

use crate::address::AddressFormat;
use crate::client::{ChainClient, ChainConfig};
use crate::error::{ChainError, ChainResult};
use crate::retry::{self, READ_ATTEMPTS};
use crate::rpc::RpcEndpoint;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

pub struct SignerClient {
    rpc: RpcEndpoint,
    signer_path: String,
    key_path: String,
    wallet_address: String,
    token_contract: String,
    balance_entry_point: String,
    format: AddressFormat,
    timeout_secs: u64,
}

impl SignerClient {
    pub fn new(rpc: RpcEndpoint, config: &ChainConfig) -> Self {
        Self {
            rpc,
            signer_path: config.signer_path.clone(),
            key_path: config.key_path.clone(),
            wallet_address: config.wallet_address.clone(),
            token_contract: config.token_contract.clone(),
            balance_entry_point: config.balance_entry_point.clone(),
            format: config.address_format,
            timeout_secs: config.timeout_secs,
        }
    }

    /// Pipes the unsigned payload to the signer and parses the signed
    /// envelope off its stdout. The child is killed if it outlives the
    /// call timeout.
    async fn invoke_signer(&self, unsigned: &Value) -> ChainResult<Value> {
        let mut child = Command::new(&self.signer_path)
            .arg(&self.key_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ChainError::Spawn {
                command: self.signer_path.clone(),
                reason: e.to_string(),
            })?;

        let payload = unsigned.to_string();
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(payload.as_bytes())
                .await
                .map_err(|e| ChainError::Signer(format!("failed to feed signer: {}", e)))?;
        }

        let output = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ChainError::Timeout {
            endpoint: self.signer_path.clone(),
            seconds: self.timeout_secs,
        })?
        .map_err(|e| ChainError::Signer(format!("signer did not run to completion: {}", e)))?;

        if !output.status.success() {
            return Err(ChainError::Signer(format!(
                "signer exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ChainError::Signer(format!("signer produced invalid json: {}", e)))
    }
}

#[async_trait]
impl ChainClient for SignerClient {
    fn address_format(&self) -> AddressFormat {
        self.format
    }

    async fn balance(&self, account: &str) -> ChainResult<u64> {
        let result = self
            .rpc
            .call(
                "chain.read_contract",
                json!({
                    "contract_id": self.token_contract,
                    "entry_point": self.balance_entry_point,
                    "account": account,
                }),
            )
            .await?;
        decode_balance(&result)
    }

    async fn nonce(&self, account: &str) -> ChainResult<u64> {
        let result = self
            .rpc
            .call("chain.get_account_nonce", json!({ "account": account }))
            .await?;
        result.get("nonce").and_then(Value::as_u64).ok_or_else(|| {
            ChainError::MalformedResponse("nonce field missing or not a u64".to_string())
        })
    }

    async fn transfer(&self, to: &str, amount: u64) -> ChainResult<()> {
        // The nonce read is repeatable; everything after it is not.
        let nonce = retry::read_only("account nonce", READ_ATTEMPTS, || {
            self.nonce(&self.wallet_address)
        })
        .await?;

        let unsigned = json!({
            "from": self.wallet_address,
            "to": to,
            "amount": amount,
            "nonce": nonce,
        });

        debug!(to, amount, nonce, "signing transfer");
        let signed = self.invoke_signer(&unsigned).await?;

        // One submission only. A transport failure here leaves the
        // outcome unknown and must surface to the caller as-is.
        let result = self
            .rpc
            .call("chain.submit_transaction", json!({ "transaction": signed }))
            .await?;

        if result != json!({}) {
            return Err(ChainError::MalformedResponse(format!(
                "unexpected submit_transaction result: {}",
                result
            )));
        }

        info!(to, amount, "transfer submitted");
        Ok(())
    }
}

fn decode_balance(result: &Value) -> ChainResult<u64> {
    let value = result
        .get("value")
        .and_then(Value::as_str)
        .ok_or_else(|| ChainError::MalformedResponse("balance value missing".to_string()))?;
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(digits, 16)
        .map_err(|e| ChainError::MalformedResponse(format!("balance {} is not hex: {}", value, e)))
}
