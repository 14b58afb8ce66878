//! Player vaults and the withdrawal tax.
//!
//! Balances enter through `deposit`, which pulls tokens into the vault's own
//! custody pool, and leave through `withdraw`, which splits the amount into the player's net,
//! an optional referrer commission (credited to the referrer's own vault)
//! and the sink share.

pub mod ledger;
pub mod tax;

pub use ledger::{VaultLedger, WithdrawalReceipt};
pub use tax::{TaxBreakdown, TaxPolicy};
