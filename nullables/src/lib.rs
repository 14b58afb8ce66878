//! Nullable infrastructure for deterministic testing.
//!
//! All external collaborators (clock, price converter, token ledger,
//! storage) are abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (advance time, fail on demand)
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod oracle;
pub mod store;
pub mod token;

pub use clock::NullClock;
pub use oracle::NullPriceConverter;
pub use store::NullStore;
pub use token::NullTokenLedger;
