//! Withdrawal tax math.
//!
//! All shares are floored basis-point fractions, so
//! `net + commission + sink_share == amount` holds exactly.

use serde::{Deserialize, Serialize};
use stakevault_token::{Payout, Recipient};
use stakevault_types::{EconomyParams, PlayerAddress, TaxSink, TokenAmount};

/// The tax-related slice of the economy parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPolicy {
    pub base_tax_bps: u32,
    pub commission_bps: u32,
    pub sink: TaxSink,
}

impl From<&EconomyParams> for TaxPolicy {
    fn from(params: &EconomyParams) -> Self {
        Self {
            base_tax_bps: params.base_tax_bps,
            commission_bps: params.commission_bps,
            sink: params.tax_sink,
        }
    }
}

impl TaxPolicy {
    /// `max(0, base − reduction)`.
    pub fn effective_tax_bps(&self, reduction_bps: u32) -> u32 {
        self.base_tax_bps.saturating_sub(reduction_bps)
    }
}

/// How one withdrawal splits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub amount: TokenAmount,
    pub effective_tax_bps: u32,
    pub tax: TokenAmount,
    pub net: TokenAmount,
    /// Zero when there is no referrer.
    pub commission: TokenAmount,
    pub referrer: Option<PlayerAddress>,
    pub sink_share: TokenAmount,
    pub sink: TaxSink,
}

impl TaxBreakdown {
    pub fn compute(
        amount: TokenAmount,
        reduction_bps: u32,
        referrer: Option<PlayerAddress>,
        policy: &TaxPolicy,
    ) -> Self {
        let effective_tax_bps = policy.effective_tax_bps(reduction_bps);
        let tax = amount.bps(effective_tax_bps);
        let net = amount.saturating_sub(tax);
        let commission = match referrer {
            Some(_) => tax.bps(policy.commission_bps),
            None => TokenAmount::ZERO,
        };
        let sink_share = tax.saturating_sub(commission);
        Self {
            amount,
            effective_tax_bps,
            tax,
            net,
            commission,
            referrer,
            sink_share,
            sink: policy.sink,
        }
    }

    /// Outbound transfers for the net and the sink share, zero amounts omitted.
    /// The commission stays in custody, credited to the referrer's vault.
    pub fn payouts(&self, player: &PlayerAddress) -> Vec<Payout> {
        let mut payouts = Vec::with_capacity(2);
        if !self.net.is_zero() {
            payouts.push(Payout::to_player(*player, self.net));
        }
        if !self.sink_share.is_zero() {
            payouts.push(Payout {
                recipient: Recipient::from(self.sink),
                amount: self.sink_share,
            });
        }
        payouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TaxPolicy {
        TaxPolicy::from(&EconomyParams::default())
    }

    #[test]
    fn test_default_tax_without_referrer() {
        let b = TaxBreakdown::compute(TokenAmount::new(1_000), 0, None, &policy());
        assert_eq!(b.effective_tax_bps, 2_500);
        assert_eq!(b.tax, TokenAmount::new(250));
        assert_eq!(b.net, TokenAmount::new(750));
        assert_eq!(b.commission, TokenAmount::ZERO);
        assert_eq!(b.sink_share, TokenAmount::new(250));
    }

    #[test]
    fn test_vip_reduction_and_commission() {
        // VIP10: 500 bps off → 20% tax. 5% of 200 to the referrer.
        let referrer = PlayerAddress::new([7; 20]);
        let b = TaxBreakdown::compute(TokenAmount::new(1_000), 500, Some(referrer), &policy());
        assert_eq!(b.effective_tax_bps, 2_000);
        assert_eq!(b.tax, TokenAmount::new(200));
        assert_eq!(b.net, TokenAmount::new(800));
        assert_eq!(b.commission, TokenAmount::new(10));
        assert_eq!(b.sink_share, TokenAmount::new(190));
    }

    #[test]
    fn test_small_amounts_floor_to_zero_tax() {
        let b = TaxBreakdown::compute(TokenAmount::new(3), 0, None, &policy());
        assert_eq!(b.tax, TokenAmount::ZERO);
        assert_eq!(b.net, TokenAmount::new(3));
        let player = PlayerAddress::new([1; 20]);
        assert_eq!(b.payouts(&player), vec![Payout::to_player(player, TokenAmount::new(3))]);
    }

    #[test]
    fn test_reduction_above_base_clamps_to_zero() {
        let p = TaxPolicy {
            base_tax_bps: 300,
            ..policy()
        };
        assert_eq!(p.effective_tax_bps(1_000), 0);
    }

    #[test]
    fn test_treasury_sink_payout() {
        let treasury = PlayerAddress::new([9; 20]);
        let p = TaxPolicy {
            sink: TaxSink::Treasury(treasury),
            ..policy()
        };
        let player = PlayerAddress::new([1; 20]);
        let b = TaxBreakdown::compute(TokenAmount::new(100), 0, None, &p);
        assert_eq!(
            b.payouts(&player),
            vec![
                Payout::to_player(player, TokenAmount::new(75)),
                Payout::to_player(treasury, TokenAmount::new(25)),
            ]
        );
    }
}
