//! Stake ledger: per-player staked amounts and the unstaking state machine.
//!
//! `Unstaked → Staked → UnstakeRequested → (Staked | Unstaked)`
//!
//! This crate handles:
//! - Staking (tokens pulled into custody, VIP tier recomputed)
//! - Time-locked unstake requests, at most one per player
//! - Cancelling a pending request
//! - Claiming after the cooldown (tokens released, VIP tier recomputed)

pub mod ledger;
pub mod receipt;

pub use ledger::StakeLedger;
pub use receipt::{ClaimReceipt, StakeReceipt, TierChange};
