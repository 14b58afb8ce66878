use thiserror::Error;

/// Failure reading or writing economy state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend itself failed (I/O, map full, transaction aborted).
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("record encoding error: {0}")]
    Serialization(String),

    /// Stored bytes are readable but make no sense: wrong schema version,
    /// truncated values, totals that overflow.
    #[error("economy store is corrupted: {0}")]
    Corruption(String),
}
