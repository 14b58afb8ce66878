//! Error taxonomy shared by every ledger.
//!
//! Every operation is all-or-nothing: an `Err` means no state was mutated and
//! no value was transferred.

use thiserror::Error;

use crate::time::Timestamp;

/// Bad input: malformed names, zero or excess amounts, self-referral.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("insufficient stake: requested {requested}, staked {staked}")]
    InsufficientStake { requested: u128, staked: u128 },

    #[error("insufficient vault balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u128, available: u128 },

    #[error("invalid username {name:?}: {reason}")]
    InvalidUsername { name: String, reason: &'static str },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("the zero address cannot take part")]
    ZeroAddress,

    #[error("a player cannot refer themselves")]
    SelfReferral,

    #[error("username {0:?} is not registered")]
    UnknownUsername(String),

    #[error("registration fee not met: paid {paid}, required {required}")]
    InsufficientFee { paid: u128, required: u128 },

    #[error("basis points {0} exceed 10000")]
    InvalidBps(u32),

    #[error("value transfer failed: {0}")]
    TransferFailed(String),

    #[error("arithmetic overflow")]
    Overflow,
}

/// The request is well-formed but conflicts with current state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("username {0:?} is already taken")]
    UsernameTaken(String),

    #[error("player already owns username {0:?}")]
    AlreadyHasUsername(String),

    #[error("referrer already set")]
    ReferrerAlreadySet,

    #[error("an unstake request is already pending")]
    UnstakePending,

    #[error("no pending unstake request")]
    NoPendingUnstake,
}

/// Top-level error for every economy operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EconomyError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("cooldown not elapsed: claimable at {ready_at}, now {now}")]
    TooEarly { ready_at: Timestamp, now: Timestamp },

    #[error("caller {caller} is not the owner")]
    Unauthorized { caller: String },

    #[error("external dependency unavailable: {0}")]
    ExternalDependency(String),

    #[error("storage error: {0}")]
    Store(String),
}

/// Coarse category of an [`EconomyError`], for callers that only branch on kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    State,
    Timing,
    Authorization,
    ExternalDependency,
    Storage,
}

impl EconomyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::State(_) => ErrorCategory::State,
            Self::TooEarly { .. } => ErrorCategory::Timing,
            Self::Unauthorized { .. } => ErrorCategory::Authorization,
            Self::ExternalDependency(_) => ErrorCategory::ExternalDependency,
            Self::Store(_) => ErrorCategory::Storage,
        }
    }

    /// Short label used as a metrics/log field.
    pub fn label(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => "validation",
            ErrorCategory::State => "state",
            ErrorCategory::Timing => "timing",
            ErrorCategory::Authorization => "authorization",
            ErrorCategory::ExternalDependency => "external_dependency",
            ErrorCategory::Storage => "storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_map_one_to_one() {
        assert_eq!(
            EconomyError::from(ValidationError::ZeroAmount).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            EconomyError::from(StateError::ReferrerAlreadySet).category(),
            ErrorCategory::State
        );
        let early = EconomyError::TooEarly {
            ready_at: Timestamp::new(10),
            now: Timestamp::new(5),
        };
        assert_eq!(early.category(), ErrorCategory::Timing);
        assert_eq!(early.label(), "timing");
    }

    #[test]
    fn messages_carry_context() {
        let err = EconomyError::from(ValidationError::InsufficientStake {
            requested: 10,
            staked: 3,
        });
        assert_eq!(
            err.to_string(),
            "validation error: insufficient stake: requested 10, staked 3"
        );
    }
}
