//! Segregated custody.

use serde::{Deserialize, Serialize};

/// A custody account inside the token ledger.
///
/// Tokens collected into a pool are only ever paid out of that pool, so
/// vault withdrawals can never spend staked principal and claims can never
/// drain vault funds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    /// Principal held for stakers until they claim.
    Stake,
    /// Backing for vault balances, commissions included.
    Vault,
}

impl Pool {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stake => "stake",
            Self::Vault => "vault",
        }
    }
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
