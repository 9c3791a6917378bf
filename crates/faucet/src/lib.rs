//! Koin testnet faucet service.
//!
//! Dispatches small, throttled payouts of the chain's native token from
//! a custodial wallet over a minimal JSON HTTP surface:
//! - durable per-identifier throttle (sled)
//! - balance-proportional, capped payouts
//! - swappable chain backends (stub, signer + JSON-RPC, wallet CLI)
//! - Prometheus metrics

pub mod api;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod payout;
pub mod throttle;

pub use config::FaucetConfig;
pub use dispatch::{Dispatcher, Payout, WalletStatus};
pub use error::{FaucetError, FaucetResult};
pub use metrics::FaucetMetrics;
pub use payout::PayoutPolicy;
pub use throttle::{ThrottleDecision, ThrottleStore};
