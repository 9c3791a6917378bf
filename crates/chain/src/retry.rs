//! Bounded retry for read-only chain calls.
//!
//! Balance and nonce queries are safe to repeat, so transient transport
//! failures get a few attempts with exponential backoff. Transfers are
//! never routed through here: without an idempotency key a repeated
//! submission can double-pay.

use crate::error::ChainResult;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Attempts granted to one read-only call.
pub const READ_ATTEMPTS: u32 = 3;

const BASE_DELAY_MS: u64 = 200;
const MAX_DELAY_MS: u64 = 2_000;

/// Runs a read-only call up to `attempts` times, backing off between
/// transient failures. Fatal errors and the final failure pass through
/// unchanged.
pub async fn read_only<T, F, Fut>(op_name: &str, attempts: u32, mut call: F) -> ChainResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ChainResult<T>>,
{
    let mut failures = 0u32;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && failures + 1 < attempts => {
                failures += 1;
                let delay = backoff_delay(failures, BASE_DELAY_MS, MAX_DELAY_MS);
                warn!(
                    op = op_name,
                    attempt = failures,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient chain error, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Exponential backoff delay with jitter (0 to 10% of the delay).
pub fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}
