use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    #[error("transfer rejected: {0}")]
    Rejected(String),

    #[error("token ledger unavailable: {0}")]
    Unavailable(String),
}
