//! Per-player records: stake positions, vault accounts, usernames and referral edges.

use serde::{Deserialize, Serialize};

use crate::address::PlayerAddress;
use crate::amount::TokenAmount;
use crate::state::StakeState;
use crate::tier::VipTier;
use crate::time::Timestamp;

/// A time-locked request to release part of a stake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUnstake {
    pub amount: TokenAmount,
    pub requested_at: Timestamp,
}

impl PendingUnstake {
    /// Earliest time the request can be claimed.
    pub fn ready_at(&self, cooldown_secs: u64) -> Timestamp {
        self.requested_at.plus(cooldown_secs)
    }

    pub fn is_claimable(&self, cooldown_secs: u64, now: Timestamp) -> bool {
        self.requested_at.has_expired(cooldown_secs, now)
    }
}

/// A player's stake. Created on first stake, never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    pub owner: PlayerAddress,
    /// Still includes any amount under a pending unstake request.
    pub staked_amount: TokenAmount,
    /// Tier derived at the last stake or claim.
    pub vip_tier: VipTier,
    pub pending_unstake: Option<PendingUnstake>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl StakePosition {
    pub fn new(owner: PlayerAddress, now: Timestamp) -> Self {
        Self {
            owner,
            staked_amount: TokenAmount::ZERO,
            vip_tier: VipTier::NONE,
            pending_unstake: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> StakeState {
        if self.pending_unstake.is_some() {
            StakeState::UnstakeRequested
        } else if self.staked_amount.is_zero() {
            StakeState::Unstaked
        } else {
            StakeState::Staked
        }
    }
}

/// A player's withdrawable vault balance and lifetime counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultAccount {
    pub owner: PlayerAddress,
    pub balance: TokenAmount,
    pub total_deposited: TokenAmount,
    pub total_withdrawn: TokenAmount,
    pub commission_earned: TokenAmount,
}

impl VaultAccount {
    pub fn new(owner: PlayerAddress) -> Self {
        Self {
            owner,
            balance: TokenAmount::ZERO,
            total_deposited: TokenAmount::ZERO,
            total_withdrawn: TokenAmount::ZERO,
            commission_earned: TokenAmount::ZERO,
        }
    }
}

/// One side of the bidirectional name registry. Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameRecord {
    pub name: String,
    pub owner: PlayerAddress,
    pub registered_at: Timestamp,
}

/// Referee → referrer pointer. Set at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralEdge {
    pub referee: PlayerAddress,
    pub referrer: PlayerAddress,
    pub created_at: Timestamp,
}
