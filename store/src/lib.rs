//! Abstract storage traits for the stakevault economy core.
//!
//! State is laid out in four logical tables keyed by player address
//! (stakes, usernames, referrals, vaults; usernames additionally keyed by
//! name) plus a metadata table. Every backend (LMDB, in-memory for testing)
//! implements these traits; the rest of the codebase depends only on them.

pub mod batch;
pub mod error;
pub mod meta;
pub mod referral;
pub mod stake;
pub mod username;
pub mod vault;

pub use batch::{BatchWriter, StoreOp, WriteBatch};
pub use error::StoreError;
pub use meta::{MetaStore, SCHEMA_VERSION};
pub use referral::ReferralStore;
pub use stake::StakeStore;
pub use username::UsernameStore;
pub use vault::VaultStore;

/// Everything the economy engine needs from a backend.
pub trait EconomyStore:
    StakeStore + UsernameStore + ReferralStore + VaultStore + MetaStore + BatchWriter + Send + Sync
{
}

impl<T> EconomyStore for T where
    T: StakeStore
        + UsernameStore
        + ReferralStore
        + VaultStore
        + MetaStore
        + BatchWriter
        + Send
        + Sync
{
}
