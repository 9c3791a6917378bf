//! In-memory stand-in for a live chain.

use crate::address::AddressFormat;
use crate::client::ChainClient;
use crate::error::ChainResult;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Fixed-balance backend for environments without a node.
///
/// Every balance query reports the custodial balance, transfers always
/// succeed and debit it in memory (saturating at zero), and the nonce
/// is a plain counter.
pub struct StubClient {
    balance: AtomicU64,
    nonce: AtomicU64,
    format: AddressFormat,
}

impl StubClient {
    pub fn new(opening_balance: u64, format: AddressFormat) -> Self {
        Self {
            balance: AtomicU64::new(opening_balance),
            nonce: AtomicU64::new(0),
            format,
        }
    }
}

#[async_trait]
impl ChainClient for StubClient {
    fn address_format(&self) -> AddressFormat {
        self.format
    }

    async fn balance(&self, _account: &str) -> ChainResult<u64> {
        Ok(self.balance.load(Ordering::SeqCst))
    }

    async fn nonce(&self, _account: &str) -> ChainResult<u64> {
        Ok(self.nonce.load(Ordering::SeqCst))
    }

    async fn transfer(&self, to: &str, amount: u64) -> ChainResult<()> {
        // The update closure always yields a value, so fetch_update
        // cannot fail here.
        let before = self
            .balance
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |balance| {
                Some(balance.saturating_sub(amount))
            })
            .unwrap_or_default();
        self.nonce.fetch_add(1, Ordering::SeqCst);

        debug!(
            to,
            amount,
            remaining = before.saturating_sub(amount),
            "stub transfer applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transfers_debit_the_custodial_balance() {
        let stub = StubClient::new(1_000, AddressFormat::Base58);

        stub.transfer("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", 300)
            .await
            .unwrap();
        assert_eq!(stub.balance("any").await.unwrap(), 700);

        // Same answer regardless of the queried account.
        assert_eq!(stub.balance("other").await.unwrap(), 700);
    }

    #[tokio::test]
    async fn overdraw_saturates_at_zero() {
        let stub = StubClient::new(100, AddressFormat::Hex);
        stub.transfer("0xdest", 101).await.unwrap();
        assert_eq!(stub.balance("any").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn nonce_advances_per_transfer() {
        let stub = StubClient::new(50, AddressFormat::Hex);
        assert_eq!(stub.nonce("any").await.unwrap(), 0);

        stub.transfer("0xdest", 10).await.unwrap();
        stub.transfer("0xdest", 10).await.unwrap();
        assert_eq!(stub.nonce("any").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn zero_amount_transfers_are_accepted() {
        let stub = StubClient::new(0, AddressFormat::Hex);
        stub.transfer("0xdest", 0).await.unwrap();
        assert_eq!(stub.balance("any").await.unwrap(), 0);
    }
}
