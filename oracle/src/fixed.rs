//! Fixed-rate conversion: `usd = amount × numerator / denominator`.

use serde::{Deserialize, Serialize};
use stakevault_types::{TokenAmount, UsdValue};

use crate::{OracleError, PriceConverter};

/// A constant exchange rate, for deployments that pin the token price and
/// for local development.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedRateConverter {
    pub numerator: u128,
    pub denominator: u128,
}

impl FixedRateConverter {
    /// Returns `None` when the denominator is zero.
    pub fn new(numerator: u128, denominator: u128) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        Some(Self {
            numerator,
            denominator,
        })
    }

    /// One token unit is worth one USD unit.
    pub fn one_to_one() -> Self {
        Self {
            numerator: 1,
            denominator: 1,
        }
    }
}

impl PriceConverter for FixedRateConverter {
    fn usd_value_of(&self, amount: TokenAmount) -> Result<UsdValue, OracleError> {
        if self.denominator == 0 {
            return Err(OracleError::Unavailable("zero denominator".into()));
        }
        let product = amount
            .raw()
            .checked_mul(self.numerator)
            .ok_or(OracleError::Overflow(amount.raw()))?;
        Ok(UsdValue::new(product / self.denominator))
    }

    fn name(&self) -> &str {
        "fixed-rate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_with_floor() {
        let conv = FixedRateConverter::new(3, 2).unwrap();
        assert_eq!(
            conv.usd_value_of(TokenAmount::new(5)).unwrap(),
            UsdValue::new(7)
        );
    }

    #[test]
    fn zero_denominator_rejected() {
        assert!(FixedRateConverter::new(1, 0).is_none());
    }

    #[test]
    fn overflow_is_an_error() {
        let conv = FixedRateConverter::new(2, 1).unwrap();
        assert_eq!(
            conv.usd_value_of(TokenAmount::new(u128::MAX)),
            Err(OracleError::Overflow(u128::MAX))
        );
    }
}
