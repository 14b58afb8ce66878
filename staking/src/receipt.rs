//! Results of successful stake ledger mutations.

use serde::{Deserialize, Serialize};
use stakevault_types::{PlayerAddress, StakePosition, TokenAmount, VipTier};

/// A VIP tier transition caused by a stake or claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierChange {
    pub player: PlayerAddress,
    pub old_tier: VipTier,
    pub new_tier: VipTier,
}

impl TierChange {
    /// `Some` only when the tier actually moved.
    pub fn between(player: PlayerAddress, old_tier: VipTier, new_tier: VipTier) -> Option<Self> {
        (old_tier != new_tier).then_some(Self {
            player,
            old_tier,
            new_tier,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StakeReceipt {
    pub amount: TokenAmount,
    pub position: StakePosition,
    pub tier_change: Option<TierChange>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimReceipt {
    /// Exactly the amount recorded by the request.
    pub amount: TokenAmount,
    pub position: StakePosition,
    pub tier_change: Option<TierChange>,
}
