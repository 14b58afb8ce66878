//! Per-player staking states.

use serde::{Deserialize, Serialize};

/// Where a player's stake sits in the unstaking state machine.
///
/// `Unstaked → Staked → UnstakeRequested → (Staked | Unstaked)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StakeState {
    /// Nothing staked and nothing pending.
    Unstaked,
    /// Stake held, no unstake request.
    Staked,
    /// An unstake request is waiting for its cooldown or claim.
    UnstakeRequested,
}

impl StakeState {
    /// Whether a new unstake request may be opened.
    pub fn can_request_unstake(&self) -> bool {
        matches!(self, Self::Staked)
    }

    /// Whether a claim or cancel has something to act on.
    pub fn has_pending(&self) -> bool {
        matches!(self, Self::UnstakeRequested)
    }
}
