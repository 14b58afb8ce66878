//! Nullable token ledger: in-memory balances with failure injection.

use stakevault_token::{total_of, Payout, Pool, Recipient, TokenError, TokenLedger};
use stakevault_types::{PlayerAddress, TokenAmount};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Balances {
    wallets: HashMap<PlayerAddress, u128>,
    pools: HashMap<Pool, u128>,
    burned: u128,
}

/// An in-memory [`TokenLedger`] for tests.
///
/// Players hold wallet balances; `collect` moves tokens into a custody pool
/// and `disburse` pays out of that pool only. Either direction can be made
/// to fail.
#[derive(Default)]
pub struct NullTokenLedger {
    balances: Mutex<Balances>,
    fail_collect: AtomicBool,
    fail_disburse: AtomicBool,
}

impl NullTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give a player spendable tokens.
    pub fn fund(&self, player: &PlayerAddress, amount: u128) {
        *self
            .balances
            .lock()
            .unwrap()
            .wallets
            .entry(*player)
            .or_default() += amount;
    }

    /// Put tokens straight into a custody pool.
    pub fn fund_pool(&self, pool: Pool, amount: u128) {
        *self.balances.lock().unwrap().pools.entry(pool).or_default() += amount;
    }

    pub fn balance_of(&self, player: &PlayerAddress) -> u128 {
        self.balances
            .lock()
            .unwrap()
            .wallets
            .get(player)
            .copied()
            .unwrap_or(0)
    }

    pub fn custody(&self, pool: Pool) -> u128 {
        self.balances
            .lock()
            .unwrap()
            .pools
            .get(&pool)
            .copied()
            .unwrap_or(0)
    }

    pub fn burned(&self) -> u128 {
        self.balances.lock().unwrap().burned
    }

    pub fn set_fail_collect(&self, fail: bool) {
        self.fail_collect.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_disburse(&self, fail: bool) {
        self.fail_disburse.store(fail, Ordering::SeqCst);
    }
}

impl TokenLedger for NullTokenLedger {
    fn collect(
        &self,
        pool: Pool,
        from: &PlayerAddress,
        amount: TokenAmount,
    ) -> Result<(), TokenError> {
        if self.fail_collect.load(Ordering::SeqCst) {
            return Err(TokenError::Rejected("collect switched off".into()));
        }
        let mut balances = self.balances.lock().unwrap();
        let available = balances.wallets.get(from).copied().unwrap_or(0);
        if available < amount.raw() {
            return Err(TokenError::InsufficientFunds {
                needed: amount.raw(),
                available,
            });
        }
        balances.wallets.insert(*from, available - amount.raw());
        *balances.pools.entry(pool).or_default() += amount.raw();
        Ok(())
    }

    fn disburse(&self, pool: Pool, payouts: &[Payout]) -> Result<(), TokenError> {
        if self.fail_disburse.load(Ordering::SeqCst) {
            return Err(TokenError::Rejected("disburse switched off".into()));
        }
        let total = total_of(payouts)
            .ok_or_else(|| TokenError::Rejected("payout total overflows".into()))?;
        let mut balances = self.balances.lock().unwrap();
        let held = balances.pools.get(&pool).copied().unwrap_or(0);
        if held < total.raw() {
            return Err(TokenError::InsufficientFunds {
                needed: total.raw(),
                available: held,
            });
        }
        balances.pools.insert(pool, held - total.raw());
        for payout in payouts {
            match payout.recipient {
                Recipient::Player(addr) => {
                    *balances.wallets.entry(addr).or_default() += payout.amount.raw();
                }
                Recipient::Burn => balances.burned += payout.amount.raw(),
            }
        }
        Ok(())
    }
}
