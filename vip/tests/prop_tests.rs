use proptest::prelude::*;

use stakevault_types::UsdValue;
use stakevault_vip::{isqrt, reduction_bps, tier, MAX_REDUCTION_BPS};

proptest! {
    /// isqrt(n) is the largest r with r² ≤ n.
    #[test]
    fn isqrt_is_floor_root(n in any::<u128>()) {
        let r = isqrt(n);
        prop_assert!(r.checked_mul(r).map_or(false, |sq| sq <= n));
        let next = r + 1;
        prop_assert!(next.checked_mul(next).map_or(true, |sq| sq > n));
    }

    /// Tier never decreases as the USD value grows.
    #[test]
    fn tier_monotonic(a in any::<u128>(), b in any::<u128>()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(tier(UsdValue::new(lo)) <= tier(UsdValue::new(hi)));
    }

    /// Every USD value at or above 40 000 sits on the cap.
    #[test]
    fn tier_capped_above_threshold(usd in 40_000u128..) {
        prop_assert_eq!(tier(UsdValue::new(usd)).level(), 20);
        prop_assert_eq!(reduction_bps(tier(UsdValue::new(usd))), MAX_REDUCTION_BPS);
    }

    /// Reduction never exceeds 10%.
    #[test]
    fn reduction_bounded(usd in any::<u128>()) {
        prop_assert!(reduction_bps(tier(UsdValue::new(usd))) <= MAX_REDUCTION_BPS);
    }
}
