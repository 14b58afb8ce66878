//! Vault balances.

use std::collections::HashMap;

use stakevault_store::{StoreError, VaultStore, WriteBatch};
use stakevault_token::{Pool, TokenLedger};
use stakevault_types::{
    EconomyError, PlayerAddress, TokenAmount, ValidationError, VaultAccount,
};

use crate::tax::{TaxBreakdown, TaxPolicy};

/// Result of a successful withdrawal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawalReceipt {
    pub breakdown: TaxBreakdown,
    /// The withdrawing player's account after the withdrawal.
    pub account: VaultAccount,
}

/// Per-player vault accounts and the sum of their balances.
#[derive(Debug, Default)]
pub struct VaultLedger {
    accounts: HashMap<PlayerAddress, VaultAccount>,
    total_balances: TokenAmount,
}

impl VaultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, player: &PlayerAddress) -> TokenAmount {
        self.accounts
            .get(player)
            .map(|a| a.balance)
            .unwrap_or(TokenAmount::ZERO)
    }

    pub fn account(&self, player: &PlayerAddress) -> Option<&VaultAccount> {
        self.accounts.get(player)
    }

    pub fn total_balances(&self) -> TokenAmount {
        self.total_balances
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Pull `amount` from the player's wallet into the vault pool and credit
    /// it to their vault. A failed transfer credits nothing.
    pub fn deposit(
        &mut self,
        player: &PlayerAddress,
        amount: TokenAmount,
        token: &dyn TokenLedger,
    ) -> Result<VaultAccount, EconomyError> {
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }
        if player.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }
        let total = self
            .total_balances
            .checked_add(amount)
            .ok_or(ValidationError::Overflow)?;
        let mut account = self
            .accounts
            .get(player)
            .cloned()
            .unwrap_or_else(|| VaultAccount::new(*player));
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(ValidationError::Overflow)?;
        account.total_deposited = account
            .total_deposited
            .checked_add(amount)
            .ok_or(ValidationError::Overflow)?;

        let previous = self.accounts.insert(*player, account.clone());
        let previous_total = std::mem::replace(&mut self.total_balances, total);

        if let Err(e) = token.collect(Pool::Vault, player, amount) {
            self.restore(player, previous);
            self.total_balances = previous_total;
            tracing::warn!(player = %player, amount = %amount, error = %e, "vault deposit transfer failed, rolled back");
            return Err(ValidationError::TransferFailed(e.to_string()).into());
        }

        tracing::info!(player = %player, amount = %amount, balance = %account.balance, "vault deposit");
        Ok(account)
    }

    /// Input checks shared by [`Self::quote_withdrawal`] and [`Self::withdraw`].
    pub fn check_withdrawal(
        &self,
        player: &PlayerAddress,
        amount: TokenAmount,
    ) -> Result<(), EconomyError> {
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }
        let available = self.balance(player);
        if amount > available {
            return Err(ValidationError::InsufficientBalance {
                requested: amount.raw(),
                available: available.raw(),
            }
            .into());
        }
        Ok(())
    }

    /// Preview a withdrawal. Fails exactly when [`Self::withdraw`] would fail validation.
    pub fn quote_withdrawal(
        &self,
        player: &PlayerAddress,
        amount: TokenAmount,
        reduction_bps: u32,
        referrer: Option<PlayerAddress>,
        policy: &TaxPolicy,
    ) -> Result<TaxBreakdown, EconomyError> {
        self.check_withdrawal(player, amount)?;
        Ok(TaxBreakdown::compute(amount, reduction_bps, referrer, policy))
    }

    /// Debit `amount`, pay out net and sink share in one transfer, credit the
    /// referrer's commission.
    pub fn withdraw(
        &mut self,
        player: &PlayerAddress,
        amount: TokenAmount,
        reduction_bps: u32,
        referrer: Option<PlayerAddress>,
        policy: &TaxPolicy,
        token: &dyn TokenLedger,
    ) -> Result<WithdrawalReceipt, EconomyError> {
        let breakdown = self.quote_withdrawal(player, amount, reduction_bps, referrer, policy)?;

        let previous_player = self.accounts.get(player).cloned();
        let previous_referrer = referrer.and_then(|r| self.accounts.get(&r).cloned());
        let previous_total = self.total_balances;

        let account = self.apply_withdrawal(player, &breakdown)?;

        if let Err(e) = token.disburse(Pool::Vault, &breakdown.payouts(player)) {
            if let Some(r) = referrer {
                self.restore(&r, previous_referrer);
            }
            self.restore(player, previous_player);
            self.total_balances = previous_total;
            tracing::warn!(player = %player, amount = %amount, error = %e, "withdrawal transfer failed, rolled back");
            return Err(ValidationError::TransferFailed(e.to_string()).into());
        }

        tracing::info!(
            player = %player,
            amount = %amount,
            tax = %breakdown.tax,
            net = %breakdown.net,
            commission = %breakdown.commission,
            effective_tax_bps = breakdown.effective_tax_bps,
            "vault withdrawal"
        );
        Ok(WithdrawalReceipt { breakdown, account })
    }

    fn apply_withdrawal(
        &mut self,
        player: &PlayerAddress,
        breakdown: &TaxBreakdown,
    ) -> Result<VaultAccount, EconomyError> {
        // Validated by the quote: the account exists and holds at least `amount`.
        let account = self
            .accounts
            .get_mut(player)
            .ok_or(ValidationError::InsufficientBalance {
                requested: breakdown.amount.raw(),
                available: 0,
            })?;
        account.balance = account.balance.saturating_sub(breakdown.amount);
        account.total_withdrawn = account.total_withdrawn.saturating_add(breakdown.amount);
        let snapshot = account.clone();

        let mut total = self.total_balances.saturating_sub(breakdown.amount);
        if let (Some(referrer), false) = (breakdown.referrer, breakdown.commission.is_zero()) {
            let credited = self
                .accounts
                .entry(referrer)
                .or_insert_with(|| VaultAccount::new(referrer));
            credited.balance = credited.balance.saturating_add(breakdown.commission);
            credited.commission_earned = credited
                .commission_earned
                .saturating_add(breakdown.commission);
            total = total.saturating_add(breakdown.commission);
        }
        self.total_balances = total;
        Ok(snapshot)
    }

    fn restore(&mut self, player: &PlayerAddress, previous: Option<VaultAccount>) {
        match previous {
            Some(account) => {
                self.accounts.insert(*player, account);
            }
            None => {
                self.accounts.remove(player);
            }
        }
    }

    pub fn stage(&self, player: &PlayerAddress, batch: &mut WriteBatch) {
        if let Some(account) = self.accounts.get(player) {
            batch.put_vault(account.clone());
        }
    }

    pub fn load_from_store<S: VaultStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        let mut ledger = Self::new();
        for account in store.iter_vaults()? {
            ledger.total_balances = ledger
                .total_balances
                .checked_add(account.balance)
                .ok_or_else(|| StoreError::Corruption("total vault balance overflows".into()))?;
            ledger.accounts.insert(account.owner, account);
        }
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakevault_nullables::{NullStore, NullTokenLedger};
    use stakevault_store::BatchWriter;
    use stakevault_types::{EconomyParams, TaxSink};

    fn addr(n: u8) -> PlayerAddress {
        PlayerAddress::new([n; 20])
    }

    fn policy() -> TaxPolicy {
        TaxPolicy::from(&EconomyParams::default())
    }

    /// A ledger with `amount` deposited by player 1 out of their wallet.
    fn funded(amount: u128) -> (VaultLedger, NullTokenLedger) {
        let token = NullTokenLedger::new();
        token.fund(&addr(1), amount);
        let mut vault = VaultLedger::new();
        vault
            .deposit(&addr(1), TokenAmount::new(amount), &token)
            .unwrap();
        (vault, token)
    }

    #[test]
    fn test_deposit_accumulates() {
        let token = NullTokenLedger::new();
        token.fund(&addr(1), 20);
        let mut vault = VaultLedger::new();
        vault.deposit(&addr(1), TokenAmount::new(10), &token).unwrap();
        let account = vault.deposit(&addr(1), TokenAmount::new(5), &token).unwrap();
        assert_eq!(account.balance, TokenAmount::new(15));
        assert_eq!(account.total_deposited, TokenAmount::new(15));
        assert_eq!(vault.total_balances(), TokenAmount::new(15));
        assert_eq!(token.balance_of(&addr(1)), 5);
        assert_eq!(token.custody(Pool::Vault), 15);
        assert_eq!(token.custody(Pool::Stake), 0);
    }

    #[test]
    fn test_zero_deposit_rejected() {
        let token = NullTokenLedger::new();
        let mut vault = VaultLedger::new();
        assert_eq!(
            vault
                .deposit(&addr(1), TokenAmount::ZERO, &token)
                .unwrap_err(),
            EconomyError::Validation(ValidationError::ZeroAmount)
        );
        assert!(vault.account(&addr(1)).is_none());
    }

    #[test]
    fn test_unfunded_deposit_credits_nothing() {
        let (mut vault, token) = funded(100);
        token.fund_pool(Pool::Stake, 1_000);

        let err = vault
            .deposit(&addr(2), TokenAmount::new(1_000), &token)
            .unwrap_err();
        assert!(matches!(
            err,
            EconomyError::Validation(ValidationError::TransferFailed(_))
        ));
        assert!(vault.account(&addr(2)).is_none());

        // An existing account keeps its previous balance.
        let err = vault
            .deposit(&addr(1), TokenAmount::new(1), &token)
            .unwrap_err();
        assert!(matches!(
            err,
            EconomyError::Validation(ValidationError::TransferFailed(_))
        ));
        assert_eq!(vault.balance(&addr(1)), TokenAmount::new(100));
        assert_eq!(vault.total_balances(), TokenAmount::new(100));
        assert_eq!(token.custody(Pool::Vault), 100);
        assert_eq!(token.custody(Pool::Stake), 1_000);
    }

    #[test]
    fn test_withdraw_only_spends_vault_pool() {
        let (mut vault, token) = funded(100);
        token.fund_pool(Pool::Stake, 1_000);
        // Balance the ledger cannot back; the stake pool must stay untouched.
        vault.accounts.get_mut(&addr(1)).unwrap().balance = TokenAmount::new(1_000);
        vault.total_balances = TokenAmount::new(1_000);

        let err = vault
            .withdraw(&addr(1), TokenAmount::new(1_000), 0, None, &policy(), &token)
            .unwrap_err();
        assert!(matches!(
            err,
            EconomyError::Validation(ValidationError::TransferFailed(_))
        ));
        assert_eq!(token.custody(Pool::Stake), 1_000);
        assert_eq!(token.custody(Pool::Vault), 100);
        assert_eq!(vault.balance(&addr(1)), TokenAmount::new(1_000));
    }

    #[test]
    fn test_withdraw_without_referrer_burns_tax() {
        let (mut vault, token) = funded(1_000);
        let receipt = vault
            .withdraw(&addr(1), TokenAmount::new(1_000), 0, None, &policy(), &token)
            .unwrap();
        assert_eq!(receipt.breakdown.net, TokenAmount::new(750));
        assert_eq!(receipt.account.balance, TokenAmount::ZERO);
        assert_eq!(receipt.account.total_withdrawn, TokenAmount::new(1_000));
        assert_eq!(token.balance_of(&addr(1)), 750);
        assert_eq!(token.burned(), 250);
        assert_eq!(token.custody(Pool::Vault), 0);
        assert_eq!(vault.total_balances(), TokenAmount::ZERO);
    }

    #[test]
    fn test_withdraw_credits_commission_to_referrer_vault() {
        let (mut vault, token) = funded(1_000);
        let receipt = vault
            .withdraw(&addr(1), TokenAmount::new(1_000), 0, Some(addr(2)), &policy(), &token)
            .unwrap();
        // tax 250, commission 12 (floor of 12.5), sink 238
        assert_eq!(receipt.breakdown.commission, TokenAmount::new(12));
        assert_eq!(receipt.breakdown.sink_share, TokenAmount::new(238));

        let referrer = vault.account(&addr(2)).unwrap();
        assert_eq!(referrer.balance, TokenAmount::new(12));
        assert_eq!(referrer.commission_earned, TokenAmount::new(12));
        assert_eq!(referrer.total_deposited, TokenAmount::ZERO);
        assert_eq!(vault.total_balances(), TokenAmount::new(12));
        assert_eq!(token.custody(Pool::Vault), 12);
        assert_eq!(token.burned(), 238);
    }

    #[test]
    fn test_overdraw_rejected() {
        let (mut vault, token) = funded(100);
        let err = vault
            .withdraw(&addr(1), TokenAmount::new(101), 0, None, &policy(), &token)
            .unwrap_err();
        assert_eq!(
            err,
            EconomyError::Validation(ValidationError::InsufficientBalance {
                requested: 101,
                available: 100
            })
        );
        let err = vault
            .withdraw(&addr(3), TokenAmount::new(1), 0, None, &policy(), &token)
            .unwrap_err();
        assert_eq!(err.category(), stakevault_types::ErrorCategory::Validation);
    }

    #[test]
    fn test_failed_disburse_rolls_back_both_vaults() {
        let (mut vault, token) = funded(1_000);
        token.set_fail_disburse(true);
        let err = vault
            .withdraw(&addr(1), TokenAmount::new(400), 0, Some(addr(2)), &policy(), &token)
            .unwrap_err();
        assert!(matches!(
            err,
            EconomyError::Validation(ValidationError::TransferFailed(_))
        ));
        assert_eq!(vault.balance(&addr(1)), TokenAmount::new(1_000));
        assert!(vault.account(&addr(2)).is_none());
        assert_eq!(vault.total_balances(), TokenAmount::new(1_000));
        assert_eq!(token.custody(Pool::Vault), 1_000);
    }

    #[test]
    fn test_treasury_sink_receives_share() {
        let (mut vault, token) = funded(200);
        let p = TaxPolicy {
            sink: TaxSink::Treasury(addr(9)),
            ..policy()
        };
        vault
            .withdraw(&addr(1), TokenAmount::new(200), 0, None, &p, &token)
            .unwrap();
        assert_eq!(token.balance_of(&addr(9)), 50);
        assert_eq!(token.burned(), 0);
    }

    #[test]
    fn test_quote_matches_withdraw_and_does_not_mutate() {
        let (mut vault, token) = funded(5_000);
        let quote = vault
            .quote_withdrawal(&addr(1), TokenAmount::new(3_333), 350, Some(addr(2)), &policy())
            .unwrap();
        assert_eq!(vault.balance(&addr(1)), TokenAmount::new(5_000));

        let receipt = vault
            .withdraw(&addr(1), TokenAmount::new(3_333), 350, Some(addr(2)), &policy(), &token)
            .unwrap();
        assert_eq!(receipt.breakdown, quote);
    }

    #[test]
    fn test_store_round_trip() {
        let (mut vault, token) = funded(1_000);
        vault
            .withdraw(&addr(1), TokenAmount::new(500), 0, Some(addr(2)), &policy(), &token)
            .unwrap();

        let store = NullStore::new();
        let mut batch = WriteBatch::new();
        vault.stage(&addr(1), &mut batch);
        vault.stage(&addr(2), &mut batch);
        store.write_batch(&batch).unwrap();

        let loaded = VaultLedger::load_from_store(&store).unwrap();
        assert_eq!(loaded.total_balances(), vault.total_balances());
        assert_eq!(loaded.account(&addr(2)), vault.account(&addr(2)));
    }
}
