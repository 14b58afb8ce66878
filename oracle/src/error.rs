use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("price source not available: {0}")]
    Unavailable(String),

    #[error("price is stale: last update {age_secs}s ago")]
    Stale { age_secs: u64 },

    #[error("arithmetic overflow converting {0} tokens")]
    Overflow(u128),
}
