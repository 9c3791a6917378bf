//! Backend trait and startup selection.

use crate::address::AddressFormat;
use crate::error::ChainResult;
use crate::rpc::RpcEndpoint;
use crate::signer::SignerClient;
use crate::stub::StubClient;
use crate::types::TokenInfo;
use crate::wallet_cli::CliWalletClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Which backend drives chain access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Stub,
    Signer,
    Cli,
}

/// Chain backend configuration. Fields beyond the selected backend's
/// are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Backend driving chain access.
    pub backend: BackendKind,

    /// Address format accepted by the stub and signer backends. The
    /// CLI backend always takes wallet account names.
    pub address_format: AddressFormat,

    /// Custodial account funds are paid from.
    pub wallet_address: String,

    /// Per-call timeout for node requests and subprocesses, in seconds.
    pub timeout_secs: u64,

    /// Opening balance of the stub backend, in minor units.
    pub stub_balance: u64,

    /// JSON-RPC endpoint of the node (signer backend).
    pub rpc_url: String,

    /// Signing executable invoked per transfer (signer backend).
    pub signer_path: String,

    /// Key file handed to the signer (signer backend).
    pub key_path: String,

    /// Token contract queried for balances (signer backend).
    pub token_contract: String,

    /// Contract entry point for balance reads (signer backend).
    pub balance_entry_point: String,

    /// Wallet executable (cli backend).
    pub cli_path: String,

    /// Wallet file opened for each command batch (cli backend).
    pub wallet_file: String,

    /// Wallet password (cli backend).
    pub wallet_password: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Stub,
            address_format: AddressFormat::Base58,
            wallet_address: String::new(),
            timeout_secs: 10,
            stub_balance: 10_000_000_000,
            rpc_url: "http://localhost:8080/jsonrpc".to_string(),
            signer_path: "koin-signer".to_string(),
            key_path: "faucet.key".to_string(),
            token_contract: "koin".to_string(),
            balance_entry_point: "balance_of".to_string(),
            cli_path: "koin-wallet".to_string(),
            wallet_file: "faucet.wallet".to_string(),
            wallet_password: String::new(),
        }
    }
}

/// A blockchain backend able to report balances and move funds out of
/// the custodial account. Payload shapes stay behind this trait.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address format this backend accepts.
    fn address_format(&self) -> AddressFormat;

    /// Balance of `account` in minor units.
    async fn balance(&self, account: &str) -> ChainResult<u64>;

    /// Sequence number of `account`, where the backend exposes one.
    async fn nonce(&self, account: &str) -> ChainResult<u64>;

    /// Moves `amount` minor units from the custodial account to `to`.
    /// Callers submit at most once: a lost response leaves the outcome
    /// unknown.
    async fn transfer(&self, to: &str, amount: u64) -> ChainResult<()>;
}

/// Builds the configured backend. Called once at startup.
pub fn connect(config: &ChainConfig, token: &TokenInfo) -> ChainResult<Arc<dyn ChainClient>> {
    let client: Arc<dyn ChainClient> = match config.backend {
        BackendKind::Stub => {
            info!(
                balance = config.stub_balance,
                "using stub chain backend, transfers are not real"
            );
            Arc::new(StubClient::new(config.stub_balance, config.address_format))
        }
        BackendKind::Signer => {
            info!(rpc_url = %config.rpc_url, signer = %config.signer_path, "using signer chain backend");
            let rpc = RpcEndpoint::new(config.rpc_url.clone(), config.timeout_secs)?;
            Arc::new(SignerClient::new(rpc, config))
        }
        BackendKind::Cli => {
            info!(cli = %config.cli_path, wallet = %config.wallet_file, "using wallet CLI chain backend");
            Arc::new(CliWalletClient::new(config, token.clone()))
        }
    };
    Ok(client)
}
