//! Payout sizing.

use thiserror::Error;

const PPB: u64 = 1_000_000_000;

#[derive(Debug, Error, PartialEq)]
#[error("payout fraction must be a finite value in [0, 1], got {0}")]
pub struct InvalidFraction(pub f64);

/// Pays a fixed fraction of the custodial balance per request, bounded
/// by a hard cap.
///
/// The fraction is converted to parts-per-billion once at construction;
/// per-request arithmetic stays in integers.
#[derive(Debug, Clone, Copy)]
pub struct PayoutPolicy {
    k_ppb: u64,
    cap: u64,
}

impl PayoutPolicy {
    pub fn new(k: f64, cap: u64) -> Result<Self, InvalidFraction> {
        if !k.is_finite() || !(0.0..=1.0).contains(&k) {
            return Err(InvalidFraction(k));
        }
        Ok(Self {
            k_ppb: (k * PPB as f64).round() as u64,
            cap,
        })
    }

    /// `min(floor(balance * k), cap)`; never exceeds the balance.
    pub fn amount_for(&self, balance: u64) -> u64 {
        let share = (balance as u128 * self.k_ppb as u128 / PPB as u128) as u64;
        share.min(self.cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pays_the_fraction_rounded_down() {
        let policy = PayoutPolicy::new(0.00001, 100).unwrap();
        assert_eq!(policy.amount_for(1_000_000), 10);
        assert_eq!(policy.amount_for(1_999_999), 19);
        assert_eq!(policy.amount_for(99_999), 0);
    }

    #[test]
    fn cap_bounds_the_payout() {
        let policy = PayoutPolicy::new(0.00001, 100).unwrap();
        assert_eq!(policy.amount_for(1_000_000_000_000), 100);

        let generous = PayoutPolicy::new(1.0, 2_500).unwrap();
        assert_eq!(generous.amount_for(10_000_000_000), 2_500);
    }

    #[test]
    fn payout_never_exceeds_the_balance() {
        let policy = PayoutPolicy::new(1.0, u64::MAX).unwrap();
        for balance in [0u64, 1, 999, 10_000_000_000, u64::MAX] {
            assert!(policy.amount_for(balance) <= balance);
        }
    }

    #[test]
    fn zero_fraction_and_zero_cap_pay_nothing() {
        assert_eq!(PayoutPolicy::new(0.0, 100).unwrap().amount_for(1_000_000), 0);
        assert_eq!(PayoutPolicy::new(0.5, 0).unwrap().amount_for(1_000_000), 0);
    }

    #[test]
    fn out_of_range_fractions_are_rejected() {
        assert!(PayoutPolicy::new(-0.1, 100).is_err());
        assert!(PayoutPolicy::new(1.5, 100).is_err());
        assert!(PayoutPolicy::new(f64::NAN, 100).is_err());
        assert!(PayoutPolicy::new(f64::INFINITY, 100).is_err());
    }
}
