//! Token metadata and fixed-precision amount handling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token presented at the service boundary.
///
/// Amounts move through the service as integer minor units; `decimals`
/// only drives display formatting and wallet-output parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u32,
}

impl Default for TokenInfo {
    fn default() -> Self {
        Self {
            symbol: "KOIN".to_string(),
            decimals: 8,
        }
    }
}

/// Failure to read a decimal amount back into minor units.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("empty amount")]
    Empty,

    #[error("unexpected character {0:?} in amount")]
    BadDigit(char),

    #[error("more than {0} fractional digits")]
    TooPrecise(u32),

    #[error("amount does not fit in 64 bits")]
    Overflow,
}

impl TokenInfo {
    fn scale(&self) -> u64 {
        10u64.pow(self.decimals)
    }

    /// Renders minor units with exactly `decimals` fractional digits.
    pub fn format_minor(&self, amount: u64) -> String {
        if self.decimals == 0 {
            return amount.to_string();
        }
        let scale = self.scale();
        format!(
            "{}.{:0width$}",
            amount / scale,
            amount % scale,
            width = self.decimals as usize
        )
    }

    /// Parses a decimal amount, as a wallet prints it, into minor units.
    pub fn parse_to_minor(&self, text: &str) -> Result<u64, AmountParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AmountParseError::Empty);
        }

        let (whole, frac) = match text.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (text, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if frac.len() > self.decimals as usize {
            return Err(AmountParseError::TooPrecise(self.decimals));
        }

        let mut minor: u64 = 0;
        for c in whole.chars() {
            let digit = c.to_digit(10).ok_or(AmountParseError::BadDigit(c))? as u64;
            minor = minor
                .checked_mul(10)
                .and_then(|m| m.checked_add(digit))
                .ok_or(AmountParseError::Overflow)?;
        }
        minor = minor
            .checked_mul(self.scale())
            .ok_or(AmountParseError::Overflow)?;

        // At most `decimals` digits, so the fractional part cannot
        // itself overflow; right-pad to full precision.
        let mut frac_minor: u64 = 0;
        for c in frac.chars() {
            let digit = c.to_digit(10).ok_or(AmountParseError::BadDigit(c))? as u64;
            frac_minor = frac_minor * 10 + digit;
        }
        frac_minor *= 10u64.pow(self.decimals - frac.len() as u32);

        minor
            .checked_add(frac_minor)
            .ok_or(AmountParseError::Overflow)
    }
}
