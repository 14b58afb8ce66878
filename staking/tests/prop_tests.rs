use proptest::prelude::*;

use stakevault_nullables::{NullPriceConverter, NullTokenLedger};
use stakevault_staking::StakeLedger;
use stakevault_token::Pool;
use stakevault_types::{PlayerAddress, Timestamp, TokenAmount};

const COOLDOWN: u64 = 3_600;

fn addr(n: u8) -> PlayerAddress {
    PlayerAddress::new([n; 20])
}

proptest! {
    /// Stake in, request, claim: the player gets back exactly what they asked for
    /// and the ledger total tracks the sum of positions.
    #[test]
    fn claim_returns_exactly_the_requested_amount(
        stakes in prop::collection::vec(1u128..1_000_000, 1..6),
        fraction in 0u128..=100,
    ) {
        let oracle = NullPriceConverter::new();
        let token = NullTokenLedger::new();
        let player = addr(7);
        let funded: u128 = stakes.iter().sum();
        token.fund(&player, funded);

        let mut ledger = StakeLedger::new(COOLDOWN);
        for (i, s) in stakes.iter().enumerate() {
            ledger
                .stake(&player, TokenAmount::new(*s), &oracle, &token, Timestamp::new(i as u64))
                .unwrap();
        }
        prop_assert_eq!(ledger.total_staked(), TokenAmount::new(funded));

        let request = (funded * fraction / 100).max(1);
        ledger.request_unstake(&player, TokenAmount::new(request), Timestamp::new(100)).unwrap();
        let receipt = ledger
            .claim_unstaked(&player, &oracle, &token, Timestamp::new(100 + COOLDOWN))
            .unwrap();

        prop_assert_eq!(receipt.amount, TokenAmount::new(request));
        prop_assert_eq!(token.balance_of(&player), request);
        prop_assert_eq!(ledger.staked_amount(&player), TokenAmount::new(funded - request));
        prop_assert_eq!(ledger.total_staked(), TokenAmount::new(funded - request));
        prop_assert_eq!(token.custody(Pool::Stake), funded - request);
    }

    /// Tier recorded on the position always matches a fresh valuation of the stake.
    #[test]
    fn recorded_tier_matches_fresh_valuation(amount in 1u128..10_000_000, rate in 1u128..50) {
        let oracle = NullPriceConverter::with_rate(rate, 1);
        let token = NullTokenLedger::new();
        token.fund(&addr(1), amount);

        let mut ledger = StakeLedger::new(COOLDOWN);
        let receipt = ledger
            .stake(&addr(1), TokenAmount::new(amount), &oracle, &token, Timestamp::new(0))
            .unwrap();
        let status = ledger.vip_status(&addr(1), &oracle).unwrap();
        prop_assert_eq!(receipt.position.vip_tier, status.tier);
    }

    /// Claims are refused at every instant before the cooldown elapses.
    #[test]
    fn claim_refused_before_cooldown(requested_at in 0u64..1_000_000, early in 1u64..=COOLDOWN) {
        let oracle = NullPriceConverter::new();
        let token = NullTokenLedger::new();
        token.fund(&addr(1), 10);

        let mut ledger = StakeLedger::new(COOLDOWN);
        ledger.stake(&addr(1), TokenAmount::new(10), &oracle, &token, Timestamp::new(0)).unwrap();
        ledger.request_unstake(&addr(1), TokenAmount::new(10), Timestamp::new(requested_at)).unwrap();

        let now = Timestamp::new(requested_at + COOLDOWN - early);
        prop_assert!(ledger.claim_unstaked(&addr(1), &oracle, &token, now).is_err());
        prop_assert_eq!(ledger.staked_amount(&addr(1)), TokenAmount::new(10));
    }
}
