//! Player identity: unique usernames and one-shot referral links.
//!
//! The [`UsernameDirectory`] maps names to addresses in both directions and
//! keeps the native-currency registration fees it has collected. The
//! [`ReferralGraph`] records who referred whom, with a reverse index so a
//! referrer's downline can be listed without a scan.

pub mod referral;
pub mod username;

pub use referral::ReferralGraph;
pub use username::{validate_username, UsernameDirectory, MAX_USERNAME_LEN, MIN_USERNAME_LEN};
