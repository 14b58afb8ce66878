//! Fundamental types for the stakevault economy core.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! player addresses, token and USD amounts, timestamps and the clock seam,
//! economy parameters, per-player records, and the error taxonomy.

pub mod address;
pub mod amount;
pub mod error;
pub mod params;
pub mod record;
pub mod state;
pub mod tier;
pub mod time;

pub use address::PlayerAddress;
pub use amount::{apply_bps, TokenAmount, UsdValue, BPS_DENOMINATOR};
pub use error::{EconomyError, ErrorCategory, StateError, ValidationError};
pub use params::{EconomyParams, TaxSink};
pub use record::{PendingUnstake, ReferralEdge, StakePosition, UsernameRecord, VaultAccount};
pub use state::StakeState;
pub use tier::VipTier;
pub use time::{Clock, SystemClock, Timestamp};
