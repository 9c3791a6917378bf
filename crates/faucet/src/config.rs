//! Faucet configuration

use anyhow::{bail, Context, Result};
use koin_chain::{BackendKind, ChainConfig, TokenInfo};
use serde::{Deserialize, Serialize};

/// Longest accepted throttle window: ten years, in seconds.
const MAX_RATE_SECONDS: u64 = 315_360_000;

/// Faucet service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaucetConfig {
    /// Server listen address
    pub server_addr: String,

    /// Path of the sled database holding grant timestamps
    pub db_path: String,

    /// Seconds an identifier must wait between payouts
    pub rate_seconds: u64,

    /// Fraction of the hot wallet balance paid per request
    pub k: f64,

    /// Upper bound on a single payout, in minor units
    pub payout_cap: u64,

    /// Token presentation (symbol and decimal places)
    pub token: TokenInfo,

    /// Chain backend settings
    pub chain: ChainConfig,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Enable the /metrics endpoint
    pub metrics_enabled: bool,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:8080".to_string(),
            db_path: "./faucet_db".to_string(),
            rate_seconds: 86_400,
            k: 0.000_01,
            payout_cap: 500_000_000,
            token: TokenInfo::default(),
            chain: ChainConfig::default(),
            cors_enabled: true,
            metrics_enabled: true,
        }
    }
}

impl FaucetConfig {
    /// Load configuration from a file (YAML, TOML or JSON by extension).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .with_context(|| format!("failed to read config file: {}", path))?;

        settings
            .try_deserialize()
            .with_context(|| format!("failed to parse config file: {}", path))
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !self.k.is_finite() || !(0.0..=1.0).contains(&self.k) {
            bail!("k must be a finite fraction between 0 and 1, got {}", self.k);
        }
        if self.rate_seconds == 0 {
            bail!("rate_seconds must be at least 1");
        }
        if self.rate_seconds > MAX_RATE_SECONDS {
            bail!(
                "rate_seconds must be at most {} (ten years), got {}",
                MAX_RATE_SECONDS,
                self.rate_seconds
            );
        }
        if self.token.symbol.is_empty() {
            bail!("token symbol must not be empty");
        }
        if self.token.decimals > 18 {
            bail!("token decimals must be 18 or fewer, got {}", self.token.decimals);
        }
        if self.chain.backend != BackendKind::Stub && self.chain.wallet_address.is_empty() {
            bail!("wallet_address is required for the {:?} backend", self.chain.backend);
        }
        Ok(())
    }
}
