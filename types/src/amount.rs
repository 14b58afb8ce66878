//! Token and USD amount types.
//!
//! Amounts are fixed-point integers (u128) to avoid floating-point errors.
//! Basis-point math floors and never overflows for any `u128` amount.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Divisor for basis-point rates: 10 000 bps = 100%.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// `floor(amount × bps / 10 000)` without intermediate overflow.
///
/// Splits `amount` into quotient and remainder by the denominator so the
/// product never exceeds `u128` when `bps ≤ 10 000`.
pub fn apply_bps(amount: u128, bps: u32) -> u128 {
    let d = BPS_DENOMINATOR as u128;
    let b = bps as u128;
    (amount / d) * b + (amount % d) * b / d
}

/// Amount of the staked/vaulted game token, in raw units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// The `bps` share of this amount, floored.
    pub fn bps(self, bps: u32) -> Self {
        Self(apply_bps(self.0, bps))
    }
}

impl Add for TokenAmount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TokenAmount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl From<u128> for TokenAmount {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A USD-denominated value as produced by the price converter.
///
/// Whole-dollar units: the VIP table is expressed in this scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UsdValue(u128);

impl UsdValue {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for UsdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}
