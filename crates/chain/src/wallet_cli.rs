//! Wallet-CLI backend.
//!
//! Drives an external wallet binary one command batch at a time. The
//! wallet owns keys and transaction sequencing; this process only
//! assembles batches and scrapes stdout. Confidence in transfer
//! outcomes is limited to the wallet's exit status.

use crate::address::AddressFormat;
use crate::client::{ChainClient, ChainConfig};
use crate::error::{ChainError, ChainResult};
use crate::types::TokenInfo;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

lazy_static! {
    /// Amount-and-symbol lines in wallet output, e.g. `100.00000000 KOIN`.
    static ref BALANCE_LINE: Regex =
        Regex::new(r"(?m)^\s*([0-9]+(?:\.[0-9]+)?)\s+([A-Za-z0-9._-]+)\s*$").unwrap();
}

pub struct CliWalletClient {
    cli_path: String,
    wallet_file: String,
    wallet_password: String,
    token_contract: String,
    token: TokenInfo,
    timeout_secs: u64,
}

impl CliWalletClient {
    pub fn new(config: &ChainConfig, token: TokenInfo) -> Self {
        Self {
            cli_path: config.cli_path.clone(),
            wallet_file: config.wallet_file.clone(),
            wallet_password: config.wallet_password.clone(),
            token_contract: config.token_contract.clone(),
            token,
            timeout_secs: config.timeout_secs,
        }
    }

    /// Every batch reopens the wallet and re-registers the token: the
    /// CLI keeps no state between invocations.
    fn batch(&self, subcommand: &str) -> String {
        format!(
            "open {} {}; register_token {} {}; {}",
            self.wallet_file,
            self.wallet_password,
            self.token.symbol,
            self.token_contract,
            subcommand
        )
    }

    async fn execute(&self, subcommand: &str) -> ChainResult<String> {
        let batch = self.batch(subcommand);
        debug!(command = subcommand, "running wallet batch");

        let child = Command::new(&self.cli_path)
            .arg("--execute")
            .arg(&batch)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ChainError::Spawn {
                command: self.cli_path.clone(),
                reason: e.to_string(),
            })?;

        let output = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ChainError::Timeout {
            endpoint: self.cli_path.clone(),
            seconds: self.timeout_secs,
        })?
        .map_err(|e| ChainError::WalletCommand {
            status: -1,
            stderr: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(ChainError::WalletCommand {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn parse_balance(&self, stdout: &str) -> ChainResult<u64> {
        for caps in BALANCE_LINE.captures_iter(stdout) {
            if &caps[2] == self.token.symbol.as_str() {
                return self.token.parse_to_minor(&caps[1]).map_err(|e| {
                    ChainError::MalformedResponse(format!("wallet balance unreadable: {}", e))
                });
            }
        }
        Err(ChainError::MalformedResponse(format!(
            "no {} balance line in wallet output",
            self.token.symbol
        )))
    }
}

#[async_trait]
impl ChainClient for CliWalletClient {
    fn address_format(&self) -> AddressFormat {
        AddressFormat::Account
    }

    async fn balance(&self, account: &str) -> ChainResult<u64> {
        let stdout = self.execute(&format!("balance {}", account)).await?;
        self.parse_balance(&stdout)
    }

    async fn nonce(&self, _account: &str) -> ChainResult<u64> {
        Err(ChainError::Unsupported("cli"))
    }

    async fn transfer(&self, to: &str, amount: u64) -> ChainResult<()> {
        let display = self.token.format_minor(amount);
        self.execute(&format!("transfer {} {}", to, display)).await?;
        info!(to, amount, "wallet transfer accepted");
        Ok(())
    }
}
