//! Outbound transfer descriptions.

use serde::{Deserialize, Serialize};
use stakevault_types::{PlayerAddress, TaxSink, TokenAmount};

/// Who receives a payout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    Player(PlayerAddress),
    /// Destroyed; leaves circulation.
    Burn,
}

impl From<TaxSink> for Recipient {
    fn from(sink: TaxSink) -> Self {
        match sink {
            TaxSink::Burn => Recipient::Burn,
            TaxSink::Treasury(addr) => Recipient::Player(addr),
        }
    }
}

/// One outbound transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub recipient: Recipient,
    pub amount: TokenAmount,
}

impl Payout {
    pub fn to_player(player: PlayerAddress, amount: TokenAmount) -> Self {
        Self {
            recipient: Recipient::Player(player),
            amount,
        }
    }
}

/// Sum of all payout amounts; `None` on overflow.
pub fn total_of(payouts: &[Payout]) -> Option<TokenAmount> {
    payouts
        .iter()
        .try_fold(TokenAmount::ZERO, |acc, p| acc.checked_add(p.amount))
}
