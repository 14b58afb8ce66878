//! Token-to-USD price conversion.
//!
//! The oracle's internal pricing is owned by an external collaborator; this
//! crate only fixes the contract the economy consumes: a read-only,
//! monotonic, fallible conversion.

pub mod error;
pub mod fixed;

pub use error::OracleError;
pub use fixed::FixedRateConverter;

use stakevault_types::{TokenAmount, UsdValue};

/// Converts a token amount to its USD value.
///
/// Implementations must be monotonic non-decreasing in `amount` and must not
/// mutate any state the economy can observe.
pub trait PriceConverter: Send + Sync {
    fn usd_value_of(&self, amount: TokenAmount) -> Result<UsdValue, OracleError>;

    /// Human-readable name of this converter.
    fn name(&self) -> &str;
}
