//! Prometheus counters for the faucet.

use prometheus::{opts, Counter, Encoder, Registry, TextEncoder};

/// Faucet metrics, registered once at startup.
#[derive(Debug)]
pub struct FaucetMetrics {
    registry: Registry,

    pub payouts_total: Counter,
    pub paid_minor_units: Counter,
    pub throttled_total: Counter,
    pub rejected_addresses_total: Counter,
    pub backend_errors_total: Counter,
    pub balance_queries_total: Counter,
}

impl FaucetMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let payouts_total = Counter::with_opts(opts!(
            "faucet_payouts_total",
            "Payouts handed to the chain backend"
        ))?;

        let paid_minor_units = Counter::with_opts(opts!(
            "faucet_paid_minor_units_total",
            "Sum of paid amounts in minor units"
        ))?;

        let throttled_total = Counter::with_opts(opts!(
            "faucet_throttled_total",
            "Requests denied by the per-identifier throttle"
        ))?;

        let rejected_addresses_total = Counter::with_opts(opts!(
            "faucet_rejected_addresses_total",
            "Requests rejected for address format"
        ))?;

        let backend_errors_total = Counter::with_opts(opts!(
            "faucet_backend_errors_total",
            "Chain backend failures surfaced to clients"
        ))?;

        let balance_queries_total = Counter::with_opts(opts!(
            "faucet_balance_queries_total",
            "Balance queries answered"
        ))?;

        registry.register(Box::new(payouts_total.clone()))?;
        registry.register(Box::new(paid_minor_units.clone()))?;
        registry.register(Box::new(throttled_total.clone()))?;
        registry.register(Box::new(rejected_addresses_total.clone()))?;
        registry.register(Box::new(backend_errors_total.clone()))?;
        registry.register(Box::new(balance_queries_total.clone()))?;

        Ok(Self {
            registry,
            payouts_total,
            paid_minor_units,
            throttled_total,
            rejected_addresses_total,
            backend_errors_total,
            balance_queries_total,
        })
    }

    /// Renders the exposition text served at `/metrics`.
    pub fn gather(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
