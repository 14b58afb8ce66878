//! Core stake ledger.

use std::collections::HashMap;

use stakevault_oracle::PriceConverter;
use stakevault_store::{StakeStore, StoreError, WriteBatch};
use stakevault_token::{Payout, Pool, TokenLedger};
use stakevault_types::{
    EconomyError, PendingUnstake, PlayerAddress, StakePosition, StakeState, StateError,
    Timestamp, TokenAmount, UsdValue, ValidationError, VipTier,
};
use stakevault_vip::VipStatus;

use crate::receipt::{ClaimReceipt, StakeReceipt, TierChange};

/// Owns every [`StakePosition`] and the running total.
///
/// Mutations validate first, then update the table, then call out to the
/// token ledger. A failed transfer restores the previous record, so callers
/// never observe a half-applied operation.
pub struct StakeLedger {
    positions: HashMap<PlayerAddress, StakePosition>,
    total_staked: TokenAmount,
    cooldown_secs: u64,
}

impl StakeLedger {
    pub fn new(cooldown_secs: u64) -> Self {
        Self {
            positions: HashMap::new(),
            total_staked: TokenAmount::ZERO,
            cooldown_secs,
        }
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.cooldown_secs
    }

    /// Applies to pending requests too: readiness is computed at claim time.
    pub fn set_cooldown_secs(&mut self, secs: u64) {
        self.cooldown_secs = secs;
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn position(&self, player: &PlayerAddress) -> Option<&StakePosition> {
        self.positions.get(player)
    }

    pub fn staked_amount(&self, player: &PlayerAddress) -> TokenAmount {
        self.positions
            .get(player)
            .map(|p| p.staked_amount)
            .unwrap_or(TokenAmount::ZERO)
    }

    pub fn pending_unstake(&self, player: &PlayerAddress) -> Option<PendingUnstake> {
        self.positions.get(player).and_then(|p| p.pending_unstake)
    }

    /// When the pending request (if any) becomes claimable.
    pub fn unstake_ready_at(&self, player: &PlayerAddress) -> Option<Timestamp> {
        self.pending_unstake(player)
            .map(|p| p.ready_at(self.cooldown_secs))
    }

    pub fn state(&self, player: &PlayerAddress) -> StakeState {
        self.positions
            .get(player)
            .map(|p| p.state())
            .unwrap_or(StakeState::Unstaked)
    }

    pub fn total_staked(&self) -> TokenAmount {
        self.total_staked
    }

    /// Players with a non-zero stake.
    pub fn staker_count(&self) -> usize {
        self.positions
            .values()
            .filter(|p| !p.staked_amount.is_zero())
            .count()
    }

    pub fn positions(&self) -> impl Iterator<Item = &StakePosition> {
        self.positions.values()
    }

    /// Fresh VIP valuation of the player's current stake. Pure read; an empty
    /// stake is tier 0 without asking the oracle.
    pub fn vip_status(
        &self,
        player: &PlayerAddress,
        oracle: &dyn PriceConverter,
    ) -> Result<VipStatus, EconomyError> {
        let staked = self.staked_amount(player);
        if staked.is_zero() {
            return Ok(VipStatus::from_usd(UsdValue::ZERO));
        }
        let usd = oracle
            .usd_value_of(staked)
            .map_err(|e| EconomyError::ExternalDependency(e.to_string()))?;
        Ok(VipStatus::from_usd(usd))
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Add `amount` to the player's stake and pull it into custody.
    pub fn stake(
        &mut self,
        player: &PlayerAddress,
        amount: TokenAmount,
        oracle: &dyn PriceConverter,
        token: &dyn TokenLedger,
        now: Timestamp,
    ) -> Result<StakeReceipt, EconomyError> {
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }
        if player.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }

        let previous = self.positions.get(player).cloned();
        let mut position = previous
            .clone()
            .unwrap_or_else(|| StakePosition::new(*player, now));
        let new_staked = position
            .staked_amount
            .checked_add(amount)
            .ok_or(ValidationError::Overflow)?;
        let new_total = self
            .total_staked
            .checked_add(amount)
            .ok_or(ValidationError::Overflow)?;
        let new_tier = tier_for(oracle, new_staked)?;

        let old_tier = position.vip_tier;
        position.staked_amount = new_staked;
        position.vip_tier = new_tier;
        position.updated_at = now;

        let previous_total = self.total_staked;
        self.positions.insert(*player, position.clone());
        self.total_staked = new_total;

        if let Err(e) = token.collect(Pool::Stake, player, amount) {
            self.restore(player, previous, previous_total);
            tracing::warn!(player = %player, amount = %amount, error = %e, "stake transfer failed, rolled back");
            return Err(ValidationError::TransferFailed(e.to_string()).into());
        }

        tracing::info!(
            player = %player,
            amount = %amount,
            staked = %new_staked,
            tier = new_tier.level(),
            "stake added"
        );

        Ok(StakeReceipt {
            amount,
            position,
            tier_change: TierChange::between(*player, old_tier, new_tier),
        })
    }

    /// Open a time-locked request to release `amount`.
    ///
    /// The requested amount keeps counting towards the VIP tier until it is
    /// claimed.
    pub fn request_unstake(
        &mut self,
        player: &PlayerAddress,
        amount: TokenAmount,
        now: Timestamp,
    ) -> Result<PendingUnstake, EconomyError> {
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }
        let position = self
            .positions
            .get_mut(player)
            .ok_or(ValidationError::InsufficientStake {
                requested: amount.raw(),
                staked: 0,
            })?;
        if position.pending_unstake.is_some() {
            return Err(StateError::UnstakePending.into());
        }
        if amount > position.staked_amount {
            return Err(ValidationError::InsufficientStake {
                requested: amount.raw(),
                staked: position.staked_amount.raw(),
            }
            .into());
        }

        let pending = PendingUnstake {
            amount,
            requested_at: now,
        };
        position.pending_unstake = Some(pending);
        position.updated_at = now;

        tracing::info!(
            player = %player,
            amount = %amount,
            ready_at = %pending.ready_at(self.cooldown_secs),
            "unstake requested"
        );
        Ok(pending)
    }

    /// Withdraw a pending request before it is claimed.
    pub fn cancel_unstake(
        &mut self,
        player: &PlayerAddress,
        now: Timestamp,
    ) -> Result<PendingUnstake, EconomyError> {
        let position = self
            .positions
            .get_mut(player)
            .ok_or(StateError::NoPendingUnstake)?;
        let pending = position
            .pending_unstake
            .take()
            .ok_or(StateError::NoPendingUnstake)?;
        position.updated_at = now;

        tracing::info!(player = %player, amount = %pending.amount, "unstake cancelled");
        Ok(pending)
    }

    /// Release a pending request once its cooldown has elapsed.
    pub fn claim_unstaked(
        &mut self,
        player: &PlayerAddress,
        oracle: &dyn PriceConverter,
        token: &dyn TokenLedger,
        now: Timestamp,
    ) -> Result<ClaimReceipt, EconomyError> {
        let previous = self
            .positions
            .get(player)
            .cloned()
            .ok_or(StateError::NoPendingUnstake)?;
        let pending = previous
            .pending_unstake
            .ok_or(StateError::NoPendingUnstake)?;
        if !pending.is_claimable(self.cooldown_secs, now) {
            return Err(EconomyError::TooEarly {
                ready_at: pending.ready_at(self.cooldown_secs),
                now,
            });
        }

        let new_staked = previous
            .staked_amount
            .checked_sub(pending.amount)
            .ok_or(ValidationError::InsufficientStake {
                requested: pending.amount.raw(),
                staked: previous.staked_amount.raw(),
            })?;
        let new_total = self
            .total_staked
            .checked_sub(pending.amount)
            .ok_or(ValidationError::Overflow)?;
        let new_tier = tier_for(oracle, new_staked)?;

        let mut position = previous.clone();
        let old_tier = position.vip_tier;
        position.staked_amount = new_staked;
        position.vip_tier = new_tier;
        position.pending_unstake = None;
        position.updated_at = now;

        let previous_total = self.total_staked;
        self.positions.insert(*player, position.clone());
        self.total_staked = new_total;

        let payout = [Payout::to_player(*player, pending.amount)];
        if let Err(e) = token.disburse(Pool::Stake, &payout) {
            self.restore(player, Some(previous), previous_total);
            tracing::warn!(player = %player, amount = %pending.amount, error = %e, "unstake payout failed, rolled back");
            return Err(ValidationError::TransferFailed(e.to_string()).into());
        }

        tracing::info!(
            player = %player,
            amount = %pending.amount,
            staked = %new_staked,
            tier = new_tier.level(),
            "unstake claimed"
        );

        Ok(ClaimReceipt {
            amount: pending.amount,
            position,
            tier_change: TierChange::between(*player, old_tier, new_tier),
        })
    }

    fn restore(
        &mut self,
        player: &PlayerAddress,
        previous: Option<StakePosition>,
        previous_total: TokenAmount,
    ) {
        match previous {
            Some(position) => {
                self.positions.insert(*player, position);
            }
            None => {
                self.positions.remove(player);
            }
        }
        self.total_staked = previous_total;
    }
}

/// Tier for a staked amount. An empty stake is tier 0 without asking the oracle.
fn tier_for(oracle: &dyn PriceConverter, staked: TokenAmount) -> Result<VipTier, EconomyError> {
    if staked.is_zero() {
        return Ok(VipTier::NONE);
    }
    let usd = oracle
        .usd_value_of(staked)
        .map_err(|e| EconomyError::ExternalDependency(e.to_string()))?;
    Ok(stakevault_vip::tier(usd))
}

impl StakeLedger {
    /// Add the player's current record to a write batch.
    pub fn stage(&self, player: &PlayerAddress, batch: &mut WriteBatch) {
        if let Some(position) = self.positions.get(player) {
            batch.put_stake(position.clone());
        }
    }

    /// Rebuild the ledger from a stake store.
    pub fn load_from_store<S: StakeStore + ?Sized>(
        store: &S,
        cooldown_secs: u64,
    ) -> Result<Self, StoreError> {
        let mut ledger = Self::new(cooldown_secs);
        for position in store.iter_stakes()? {
            ledger.total_staked = ledger
                .total_staked
                .checked_add(position.staked_amount)
                .ok_or_else(|| StoreError::Corruption("total stake overflows".into()))?;
            ledger.positions.insert(position.owner, position);
        }
        Ok(ledger)
    }
}
