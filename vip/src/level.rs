//! Tier and tax-reduction formulas.

use serde::{Deserialize, Serialize};
use stakevault_types::{UsdValue, VipTier};

use crate::isqrt::isqrt;

/// USD divisor applied before the square root.
pub const USD_PER_TIER_UNIT: u128 = 100;

/// Tax reduction granted per tier (basis points).
pub const REDUCTION_BPS_PER_TIER: u32 = 50;

/// Upper bound on the tax reduction: 10%.
pub const MAX_REDUCTION_BPS: u32 = 1_000;

/// `min(20, isqrt(usd / 100))`.
pub fn tier(usd: UsdValue) -> VipTier {
    let root = isqrt(usd.raw() / USD_PER_TIER_UNIT);
    let capped = root.min(VipTier::MAX.level() as u128);
    VipTier::new(capped as u8)
}

/// `min(tier × 50, 1000)`.
pub fn reduction_bps(tier: VipTier) -> u32 {
    (tier.level() as u32 * REDUCTION_BPS_PER_TIER).min(MAX_REDUCTION_BPS)
}

/// Smallest USD value that reaches `tier`: `tier² × 100`.
pub fn tier_threshold(tier: VipTier) -> UsdValue {
    let level = tier.level() as u128;
    UsdValue::new(level * level * USD_PER_TIER_UNIT)
}

/// Everything derivable from one USD valuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VipStatus {
    pub usd_value: UsdValue,
    pub tier: VipTier,
    pub reduction_bps: u32,
    /// USD needed for the next tier; `None` at the cap.
    pub next_threshold: Option<UsdValue>,
}

impl VipStatus {
    pub fn from_usd(usd_value: UsdValue) -> Self {
        let tier = tier(usd_value);
        let next_threshold = if tier.is_max() {
            None
        } else {
            Some(tier_threshold(VipTier::new(tier.level() + 1)))
        };
        Self {
            usd_value,
            tier,
            reduction_bps: reduction_bps(tier),
            next_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_table() {
        let table: [(u128, u8); 10] = [
            (0, 0),
            (100, 1),
            (400, 2),
            (900, 3),
            (1_600, 4),
            (10_000, 10),
            (22_500, 15),
            (40_000, 20),
            (50_000, 20),
            (1_000_000, 20),
        ];
        for (usd, expected) in table {
            assert_eq!(
                tier(UsdValue::new(usd)).level(),
                expected,
                "tier({usd}) should be {expected}"
            );
        }
    }

    #[test]
    fn just_below_threshold_stays_on_lower_tier() {
        assert_eq!(tier(UsdValue::new(99)).level(), 0);
        assert_eq!(tier(UsdValue::new(399)).level(), 1);
        assert_eq!(tier(UsdValue::new(39_999)).level(), 19);
    }

    #[test]
    fn reduction_is_fifty_bps_per_tier() {
        for level in 0..=20u8 {
            assert_eq!(reduction_bps(VipTier::new(level)), level as u32 * 50);
        }
        assert_eq!(reduction_bps(VipTier::MAX), 1_000);
    }

    #[test]
    fn thresholds_round_trip_through_tier() {
        for level in 0..=20u8 {
            let t = VipTier::new(level);
            assert_eq!(tier(tier_threshold(t)), t);
        }
    }

    #[test]
    fn status_at_cap_has_no_next_threshold() {
        let status = VipStatus::from_usd(UsdValue::new(1_000_000));
        assert_eq!(status.tier, VipTier::MAX);
        assert_eq!(status.reduction_bps, 1_000);
        assert_eq!(status.next_threshold, None);

        let status = VipStatus::from_usd(UsdValue::new(450));
        assert_eq!(status.tier.level(), 2);
        assert_eq!(status.next_threshold, Some(UsdValue::new(900)));
    }
}
