//! VIP level calculator.
//!
//! `tier(usd) = min(20, isqrt(usd / 100))` and
//! `reduction_bps(tier) = min(tier × 50, 1000)`.
//!
//! Everything here is exact integer arithmetic so every node derives the
//! same tier from the same USD value. No floating point.

pub mod isqrt;
pub mod level;

pub use isqrt::isqrt;
pub use level::{
    reduction_bps, tier, tier_threshold, VipStatus, MAX_REDUCTION_BPS, REDUCTION_BPS_PER_TIER,
    USD_PER_TIER_UNIT,
};
