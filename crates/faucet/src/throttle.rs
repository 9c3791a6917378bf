//! Durable per-identifier throttle.

use crate::error::{FaucetError, FaucetResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use sled::Tree;
use std::sync::Mutex;
use tracing::debug;

// Microsecond-precision wire format; earlier deployments wrote stamps
// in exactly this shape, so stores carry over.
const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Outcome of a throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Denied { retry_after_secs: u64 },
}

/// Sled-backed map of identifier to last-grant time.
///
/// The gate is held across the read and the write, so concurrent
/// requests for one identifier settle to exactly one grant per window.
/// Grants are never deleted by the service.
pub struct ThrottleStore {
    grants: Tree,
    gate: Mutex<()>,
}

impl ThrottleStore {
    pub fn open(db: &sled::Db) -> FaucetResult<Self> {
        let grants = db.open_tree("grants")?;
        Ok(Self {
            grants,
            gate: Mutex::new(()),
        })
    }

    /// Grants `identifier` a payout slot if its window has elapsed,
    /// recording `now` as the new grant time. The stamp mutates only on
    /// the Allowed path.
    pub fn check_and_reserve(
        &self,
        identifier: &str,
        now: DateTime<Utc>,
        window_secs: u64,
    ) -> FaucetResult<ThrottleDecision> {
        // The window must fit chrono's signed-millisecond range.
        let window = i64::try_from(window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                FaucetError::Internal(format!(
                    "throttle window of {}s is out of range",
                    window_secs
                ))
            })?;

        let _gate = self
            .gate
            .lock()
            .map_err(|_| FaucetError::Internal("throttle gate poisoned".to_string()))?;

        if let Some(raw) = self.grants.get(identifier.as_bytes())? {
            let last = parse_stamp(&raw)?;
            let elapsed = now.signed_duration_since(last);

            if elapsed < window {
                let retry_after_secs = remaining_secs_ceil(window - elapsed);
                debug!(identifier, retry_after_secs, "inside throttle window");
                return Ok(ThrottleDecision::Denied { retry_after_secs });
            }
        }

        let stamp = now.format(STAMP_FORMAT).to_string();
        self.grants.insert(identifier.as_bytes(), stamp.as_bytes())?;
        Ok(ThrottleDecision::Allowed)
    }
}

fn parse_stamp(raw: &[u8]) -> FaucetResult<DateTime<Utc>> {
    let text = std::str::from_utf8(raw)
        .map_err(|_| FaucetError::Internal("stored grant stamp is not utf-8".to_string()))?;
    let naive = NaiveDateTime::parse_from_str(text, STAMP_FORMAT)
        .map_err(|e| FaucetError::Internal(format!("stored grant stamp unreadable: {}", e)))?;
    Ok(naive.and_utc())
}

// Whole seconds, rounded up at microsecond resolution, floor of 1 so a
// denial never tells the caller to wait zero seconds.
fn remaining_secs_ceil(remaining: chrono::Duration) -> u64 {
    let micros = remaining.num_microseconds().unwrap_or(i64::MAX);
    let secs = micros.saturating_add(999_999) / 1_000_000;
    secs.max(1) as u64
}
