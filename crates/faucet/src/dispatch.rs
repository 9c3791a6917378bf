//! Request dispatch pipeline.

use crate::auth;
use crate::error::{FaucetError, FaucetResult};
use crate::metrics::FaucetMetrics;
use crate::payout::PayoutPolicy;
use crate::throttle::{ThrottleDecision, ThrottleStore};
use chrono::Utc;
use koin_chain::retry::{self, READ_ATTEMPTS};
use koin_chain::{ChainClient, ChainError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// A payout handed to the chain backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payout {
    pub amount_minor: u64,
    pub to: String,
}

/// Custodial wallet snapshot for the status endpoint.
#[derive(Debug, Clone)]
pub struct WalletStatus {
    pub address: String,
    pub balance_minor: u64,
}

/// Ties the throttle, the payout policy and the chain backend together.
///
/// The wallet lock serializes balance read, amount computation and
/// submission: the custodial wallet is the one resource shared by all
/// in-flight requests.
pub struct Dispatcher {
    client: Arc<dyn ChainClient>,
    throttle: ThrottleStore,
    policy: PayoutPolicy,
    wallet_address: String,
    window_secs: u64,
    wallet_lock: Mutex<()>,
    metrics: Arc<FaucetMetrics>,
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn ChainClient>,
        throttle: ThrottleStore,
        policy: PayoutPolicy,
        wallet_address: String,
        window_secs: u64,
        metrics: Arc<FaucetMetrics>,
    ) -> Self {
        Self {
            client,
            throttle,
            policy,
            wallet_address,
            window_secs,
            wallet_lock: Mutex::new(()),
            metrics,
        }
    }

    /// Runs one faucet request end to end.
    pub async fn dispense(&self, identifier: &str, address: &str) -> FaucetResult<Payout> {
        auth::authorize(identifier, address)?;

        // Validation comes first: a rejected address must not consume
        // the identifier's throttle slot.
        if !self.client.address_format().is_valid(address) {
            self.metrics.rejected_addresses_total.inc();
            return Err(FaucetError::AddressFormat);
        }

        match self
            .throttle
            .check_and_reserve(identifier, Utc::now(), self.window_secs)?
        {
            ThrottleDecision::Denied { retry_after_secs } => {
                self.metrics.throttled_total.inc();
                info!(identifier, retry_after_secs, "request throttled");
                return Err(FaucetError::Throttled { retry_after_secs });
            }
            ThrottleDecision::Allowed => {}
        }

        let _wallet = self.wallet_lock.lock().await;

        let balance = retry::read_only("wallet balance", READ_ATTEMPTS, || {
            self.client.balance(&self.wallet_address)
        })
        .await
        .map_err(|e| self.backend_error(e))?;

        let amount_minor = self.policy.amount_for(balance);
        info!(identifier, address, amount_minor, balance, "dispatching payout");

        // Submitted at most once. On failure the identifier's window
        // stays consumed; the stamp is not rolled back.
        self.client
            .transfer(address, amount_minor)
            .await
            .map_err(|e| self.backend_error(e))?;

        self.metrics.payouts_total.inc();
        self.metrics.paid_minor_units.inc_by(amount_minor as f64);

        Ok(Payout {
            amount_minor,
            to: address.to_string(),
        })
    }

    /// Answers a read-only balance query; no throttle, no wallet lock.
    pub async fn balance_of(&self, address: &str) -> FaucetResult<u64> {
        if !self.client.address_format().is_valid(address) {
            self.metrics.rejected_addresses_total.inc();
            return Err(FaucetError::AddressFormat);
        }

        let balance = retry::read_only("balance query", READ_ATTEMPTS, || {
            self.client.balance(address)
        })
        .await
        .map_err(|e| self.backend_error(e))?;

        self.metrics.balance_queries_total.inc();
        Ok(balance)
    }

    /// Custodial wallet address and live balance.
    pub async fn wallet_status(&self) -> FaucetResult<WalletStatus> {
        let balance_minor = retry::read_only("wallet balance", READ_ATTEMPTS, || {
            self.client.balance(&self.wallet_address)
        })
        .await
        .map_err(|e| self.backend_error(e))?;

        Ok(WalletStatus {
            address: self.wallet_address.clone(),
            balance_minor,
        })
    }

    fn backend_error(&self, err: ChainError) -> FaucetError {
        self.metrics.backend_errors_total.inc();
        error!(error = %err, "chain backend failure");
        FaucetError::Chain(err)
    }
}
