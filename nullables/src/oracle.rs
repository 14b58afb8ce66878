//! Nullable price converter: a settable rate that can be switched off.

use stakevault_oracle::{OracleError, PriceConverter};
use stakevault_types::{TokenAmount, UsdValue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A controllable [`PriceConverter`] for tests.
///
/// Defaults to one token = one USD.
pub struct NullPriceConverter {
    rate: Mutex<(u128, u128)>,
    unavailable: AtomicBool,
}

impl NullPriceConverter {
    pub fn new() -> Self {
        Self::with_rate(1, 1)
    }

    /// `usd = amount × numerator / denominator`.
    pub fn with_rate(numerator: u128, denominator: u128) -> Self {
        Self {
            rate: Mutex::new((numerator, denominator.max(1))),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_rate(&self, numerator: u128, denominator: u128) {
        *self.rate.lock().unwrap() = (numerator, denominator.max(1));
    }

    /// Make every subsequent conversion fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl Default for NullPriceConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceConverter for NullPriceConverter {
    fn usd_value_of(&self, amount: TokenAmount) -> Result<UsdValue, OracleError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(OracleError::Unavailable("null converter switched off".into()));
        }
        let (num, den) = *self.rate.lock().unwrap();
        let product = amount
            .raw()
            .checked_mul(num)
            .ok_or(OracleError::Overflow(amount.raw()))?;
        Ok(UsdValue::new(product / den))
    }

    fn name(&self) -> &str {
        "null-price"
    }
}
