use stakevault_store::StoreError;
use stakevault_types::EconomyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Economy(#[from] EconomyError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("economy service has shut down")]
    MailboxClosed,

    #[error("economy service dropped the reply")]
    ReplyDropped,
}

impl ServiceError {
    /// The economy error inside, if this is one.
    pub fn as_economy(&self) -> Option<&EconomyError> {
        match self {
            Self::Economy(e) => Some(e),
            _ => None,
        }
    }
}
