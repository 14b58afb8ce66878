//! Value transfer seam.
//!
//! The token contract itself is external. The ledgers only need two
//! operations: pull tokens from a player into a custody [`Pool`], and pay
//! out a set of transfers from one pool atomically. Ledgers update their own
//! state before calling out and roll back if the call fails.

pub mod error;
pub mod payout;
pub mod pool;

pub use error::TokenError;
pub use payout::{total_of, Payout, Recipient};
pub use pool::Pool;

use stakevault_types::{PlayerAddress, TokenAmount};

/// Moves tokens between players and the economy's custody.
pub trait TokenLedger: Send + Sync {
    /// Pull `amount` from `from` into `pool`.
    fn collect(
        &self,
        pool: Pool,
        from: &PlayerAddress,
        amount: TokenAmount,
    ) -> Result<(), TokenError>;

    /// Pay every payout out of `pool`, or none of them. Fails when the pool
    /// holds less than the total.
    fn disburse(&self, pool: Pool, payouts: &[Payout]) -> Result<(), TokenError>;
}
