//! The economy engine: one owner of every ledger.
//!
//! Each public mutation runs to completion or leaves no trace, then emits
//! its events and records which keys it touched. [`EconomyEngine::flush`]
//! turns the touched keys into a single atomic [`WriteBatch`].

use std::collections::BTreeSet;
use std::sync::Arc;

use stakevault_directory::{ReferralGraph, UsernameDirectory};
use stakevault_oracle::PriceConverter;
use stakevault_staking::{ClaimReceipt, StakeLedger, StakeReceipt, TierChange};
use stakevault_store::{EconomyStore, MetaStore, StoreError, WriteBatch, SCHEMA_VERSION};
use stakevault_token::TokenLedger;
use stakevault_types::{
    params::check_bps, Clock, EconomyError, EconomyParams, PendingUnstake, PlayerAddress,
    ReferralEdge, TaxSink, TokenAmount, UsernameRecord, ValidationError, VaultAccount, VipTier,
};
use stakevault_utils::format_duration;
use stakevault_vault::{TaxBreakdown, TaxPolicy, VaultLedger, WithdrawalReceipt};
use stakevault_vip::VipStatus;

use crate::event::{EconomyEvent, EventBus};
use crate::ServiceError;

/// Meta key for the bincode-encoded [`EconomyParams`].
pub const META_PARAMS: &str = "params";
/// Meta key for the bincode-encoded owner address.
pub const META_OWNER: &str = "owner";
/// Meta key for collected registration fees (big-endian u128).
pub const META_COLLECTED_FEES: &str = "collected_fees";

/// External collaborators the engine calls out to.
#[derive(Clone)]
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub oracle: Arc<dyn PriceConverter>,
    pub token: Arc<dyn TokenLedger>,
}

/// Keys touched since the last successful flush.
#[derive(Debug, Default)]
struct DirtySet {
    stakes: BTreeSet<PlayerAddress>,
    usernames: BTreeSet<PlayerAddress>,
    referrals: BTreeSet<PlayerAddress>,
    vaults: BTreeSet<PlayerAddress>,
    meta: bool,
}

impl DirtySet {
    fn is_empty(&self) -> bool {
        !self.meta
            && self.stakes.is_empty()
            && self.usernames.is_empty()
            && self.referrals.is_empty()
            && self.vaults.is_empty()
    }
}

pub struct EconomyEngine {
    staking: StakeLedger,
    directory: UsernameDirectory,
    referrals: ReferralGraph,
    vault: VaultLedger,
    params: EconomyParams,
    owner: PlayerAddress,
    deps: Collaborators,
    events: EventBus,
    dirty: DirtySet,
}

impl EconomyEngine {
    /// A fresh economy. The first flush writes the parameters and owner.
    pub fn new(
        params: EconomyParams,
        owner: PlayerAddress,
        deps: Collaborators,
    ) -> Result<Self, EconomyError> {
        params.validate()?;
        if owner.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }
        Ok(Self {
            staking: StakeLedger::new(params.unstake_cooldown_secs),
            directory: UsernameDirectory::new(params.registration_fee),
            referrals: ReferralGraph::new(),
            vault: VaultLedger::new(),
            params,
            owner,
            deps,
            events: EventBus::new(),
            dirty: DirtySet {
                meta: true,
                ..DirtySet::default()
            },
        })
    }

    /// Rebuild an engine from a store.
    ///
    /// An empty store yields a fresh engine with `params` and `owner`; a store
    /// written before keeps its own parameters and owner.
    pub fn load_from_store(
        store: &dyn EconomyStore,
        params: EconomyParams,
        owner: PlayerAddress,
        deps: Collaborators,
    ) -> Result<Self, ServiceError> {
        let version = store.get_schema_version()?;
        let Some(version) = version else {
            tracing::info!("empty store, starting a fresh economy");
            return Ok(Self::new(params, owner, deps)?);
        };
        if version != SCHEMA_VERSION {
            return Err(StoreError::Corruption(format!(
                "schema version {version}, expected {SCHEMA_VERSION}"
            ))
            .into());
        }

        let params: EconomyParams = read_meta(store, META_PARAMS)?.unwrap_or(params);
        params
            .validate()
            .map_err(|e| StoreError::Corruption(format!("stored params: {e}")))?;
        let owner: PlayerAddress = read_meta(store, META_OWNER)?.unwrap_or(owner);
        if owner.is_zero() {
            return Err(StoreError::Corruption("stored owner is the zero address".into()).into());
        }
        let collected_fees = match store.get_meta(META_COLLECTED_FEES)? {
            Some(bytes) => {
                let arr: [u8; 16] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corruption(format!("collected fees has {} bytes", bytes.len()))
                })?;
                u128::from_be_bytes(arr)
            }
            None => 0,
        };

        let engine = Self {
            staking: StakeLedger::load_from_store(store, params.unstake_cooldown_secs)?,
            directory: UsernameDirectory::load_from_store(
                store,
                params.registration_fee,
                collected_fees,
            )?,
            referrals: ReferralGraph::load_from_store(store)?,
            vault: VaultLedger::load_from_store(store)?,
            params,
            owner,
            deps,
            events: EventBus::new(),
            dirty: DirtySet::default(),
        };
        tracing::info!(
            stakers = engine.staking.staker_count(),
            usernames = engine.directory.registered_count(),
            referrals = engine.referrals.edge_count(),
            vaults = engine.vault.account_count(),
            "economy loaded from store"
        );
        Ok(engine)
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn staking(&self) -> &StakeLedger {
        &self.staking
    }

    pub fn directory(&self) -> &UsernameDirectory {
        &self.directory
    }

    pub fn referrals(&self) -> &ReferralGraph {
        &self.referrals
    }

    pub fn vault(&self) -> &VaultLedger {
        &self.vault
    }

    pub fn params(&self) -> &EconomyParams {
        &self.params
    }

    pub fn owner(&self) -> PlayerAddress {
        self.owner
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&EconomyEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    fn tax_policy(&self) -> TaxPolicy {
        TaxPolicy::from(&self.params)
    }

    // ── VIP reads ───────────────────────────────────────────────────────

    /// Fresh valuation of the player's stake.
    pub fn vip_status(&self, player: &PlayerAddress) -> Result<VipStatus, EconomyError> {
        self.staking.vip_status(player, self.deps.oracle.as_ref())
    }

    pub fn vip_tier(&self, player: &PlayerAddress) -> Result<VipTier, EconomyError> {
        Ok(self.vip_status(player)?.tier)
    }

    pub fn tax_reduction_bps(&self, player: &PlayerAddress) -> Result<u32, EconomyError> {
        Ok(self.vip_status(player)?.reduction_bps)
    }

    pub fn effective_tax_bps(&self, player: &PlayerAddress) -> Result<u32, EconomyError> {
        let reduction = self.tax_reduction_bps(player)?;
        Ok(self.tax_policy().effective_tax_bps(reduction))
    }

    // ── Staking ─────────────────────────────────────────────────────────

    pub fn stake(
        &mut self,
        player: &PlayerAddress,
        amount: TokenAmount,
    ) -> Result<StakeReceipt, EconomyError> {
        let now = self.deps.clock.now();
        let receipt = self.staking.stake(
            player,
            amount,
            self.deps.oracle.as_ref(),
            self.deps.token.as_ref(),
            now,
        )?;
        self.dirty.stakes.insert(*player);
        self.events.emit(&EconomyEvent::Staked {
            player: *player,
            amount,
            total: receipt.position.staked_amount,
        });
        self.emit_tier_change(receipt.tier_change);
        Ok(receipt)
    }

    pub fn request_unstake(
        &mut self,
        player: &PlayerAddress,
        amount: TokenAmount,
    ) -> Result<PendingUnstake, EconomyError> {
        let now = self.deps.clock.now();
        let pending = self.staking.request_unstake(player, amount, now)?;
        let ready_at = pending.ready_at(self.staking.cooldown_secs());
        tracing::debug!(
            player = %player,
            cooldown = %format_duration(self.staking.cooldown_secs()),
            "unstake cooldown started"
        );
        self.dirty.stakes.insert(*player);
        self.events.emit(&EconomyEvent::UnstakeRequested {
            player: *player,
            amount,
            ready_at,
        });
        Ok(pending)
    }

    pub fn cancel_unstake(&mut self, player: &PlayerAddress) -> Result<PendingUnstake, EconomyError> {
        let now = self.deps.clock.now();
        let pending = self.staking.cancel_unstake(player, now)?;
        self.dirty.stakes.insert(*player);
        self.events.emit(&EconomyEvent::UnstakeCancelled {
            player: *player,
            amount: pending.amount,
        });
        Ok(pending)
    }

    pub fn claim_unstaked(&mut self, player: &PlayerAddress) -> Result<ClaimReceipt, EconomyError> {
        let now = self.deps.clock.now();
        let receipt = self.staking.claim_unstaked(
            player,
            self.deps.oracle.as_ref(),
            self.deps.token.as_ref(),
            now,
        )?;
        self.dirty.stakes.insert(*player);
        self.events.emit(&EconomyEvent::UnstakeClaimed {
            player: *player,
            amount: receipt.amount,
        });
        self.emit_tier_change(receipt.tier_change);
        Ok(receipt)
    }

    fn emit_tier_change(&self, change: Option<TierChange>) {
        if let Some(change) = change {
            self.events.emit(&EconomyEvent::VipLevelChanged {
                player: change.player,
                old_tier: change.old_tier,
                new_tier: change.new_tier,
            });
        }
    }

    // ── Usernames & referrals ───────────────────────────────────────────

    pub fn register_username(
        &mut self,
        caller: &PlayerAddress,
        name: &str,
        fee_paid: u128,
    ) -> Result<UsernameRecord, EconomyError> {
        let now = self.deps.clock.now();
        let record = self
            .directory
            .register_username(caller, name, fee_paid, now)?;
        self.dirty.usernames.insert(*caller);
        self.dirty.meta = true;
        self.events.emit(&EconomyEvent::UsernameRegistered {
            player: *caller,
            name: record.name.clone(),
        });
        Ok(record)
    }

    pub fn set_referrer(
        &mut self,
        caller: &PlayerAddress,
        referrer: &PlayerAddress,
    ) -> Result<ReferralEdge, EconomyError> {
        let now = self.deps.clock.now();
        let edge = self.referrals.set_referrer(caller, referrer, now)?;
        self.dirty.referrals.insert(*caller);
        self.events.emit(&EconomyEvent::ReferralSet {
            referee: edge.referee,
            referrer: edge.referrer,
        });
        Ok(edge)
    }

    pub fn set_referrer_by_username(
        &mut self,
        caller: &PlayerAddress,
        name: &str,
    ) -> Result<ReferralEdge, EconomyError> {
        let now = self.deps.clock.now();
        let edge = self
            .referrals
            .set_referrer_by_username(caller, name, &self.directory, now)?;
        self.dirty.referrals.insert(*caller);
        self.events.emit(&EconomyEvent::ReferralSet {
            referee: edge.referee,
            referrer: edge.referrer,
        });
        self.events.emit(&EconomyEvent::ReferralSetByUsername {
            referee: edge.referee,
            referrer: edge.referrer,
            name: name.to_string(),
        });
        Ok(edge)
    }

    // ── Vault ───────────────────────────────────────────────────────────

    pub fn deposit(
        &mut self,
        player: &PlayerAddress,
        amount: TokenAmount,
    ) -> Result<VaultAccount, EconomyError> {
        let account = self.vault.deposit(player, amount, self.deps.token.as_ref())?;
        self.dirty.vaults.insert(*player);
        self.events.emit(&EconomyEvent::Deposited {
            player: *player,
            amount,
        });
        Ok(account)
    }

    /// Tax breakdown the player would get right now. No mutation.
    pub fn quote_withdrawal(
        &self,
        player: &PlayerAddress,
        amount: TokenAmount,
    ) -> Result<TaxBreakdown, EconomyError> {
        // Input errors take precedence over oracle errors.
        self.vault.check_withdrawal(player, amount)?;
        let reduction = self.tax_reduction_bps(player)?;
        self.vault.quote_withdrawal(
            player,
            amount,
            reduction,
            self.referrals.referrer_of(player),
            &self.tax_policy(),
        )
    }

    pub fn withdraw(
        &mut self,
        player: &PlayerAddress,
        amount: TokenAmount,
    ) -> Result<WithdrawalReceipt, EconomyError> {
        self.vault.check_withdrawal(player, amount)?;
        let reduction = self.tax_reduction_bps(player)?;
        let referrer = self.referrals.referrer_of(player);
        let policy = self.tax_policy();
        let receipt = self.vault.withdraw(
            player,
            amount,
            reduction,
            referrer,
            &policy,
            self.deps.token.as_ref(),
        )?;

        let breakdown = receipt.breakdown;
        self.dirty.vaults.insert(*player);
        self.events.emit(&EconomyEvent::Withdrawn {
            player: *player,
            amount,
            tax: breakdown.tax,
            net: breakdown.net,
        });
        if let (Some(referrer), false) = (breakdown.referrer, breakdown.commission.is_zero()) {
            self.dirty.vaults.insert(referrer);
            self.events.emit(&EconomyEvent::CommissionPaid {
                referrer,
                referee: *player,
                amount: breakdown.commission,
            });
        }
        Ok(receipt)
    }

    // ── Administration ──────────────────────────────────────────────────

    fn require_owner(&self, caller: &PlayerAddress, action: &'static str) -> Result<(), EconomyError> {
        if *caller != self.owner {
            tracing::warn!(caller = %caller, action, "rejected admin call from non-owner");
            return Err(EconomyError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    pub fn set_registration_fee(
        &mut self,
        caller: &PlayerAddress,
        new_fee: u128,
    ) -> Result<(), EconomyError> {
        self.require_owner(caller, "set_registration_fee")?;
        self.directory.set_registration_fee(new_fee);
        self.params.registration_fee = new_fee;
        self.dirty.meta = true;
        self.events
            .emit(&EconomyEvent::UsernameRegistrationFeeUpdated { new_fee });
        Ok(())
    }

    /// Sweep collected registration fees. Settling the native currency with
    /// the owner is up to the host; the swept amount is returned and announced.
    pub fn withdraw_fees(&mut self, caller: &PlayerAddress) -> Result<u128, EconomyError> {
        self.require_owner(caller, "withdraw_fees")?;
        let amount = self.directory.withdraw_fees();
        self.dirty.meta = true;
        self.events.emit(&EconomyEvent::FeesWithdrawn {
            to: self.owner,
            amount,
        });
        Ok(amount)
    }

    pub fn set_base_tax_bps(&mut self, caller: &PlayerAddress, bps: u32) -> Result<(), EconomyError> {
        self.require_owner(caller, "set_base_tax_bps")?;
        check_bps(bps)?;
        self.params.base_tax_bps = bps;
        self.tax_params_updated();
        Ok(())
    }

    pub fn set_commission_bps(
        &mut self,
        caller: &PlayerAddress,
        bps: u32,
    ) -> Result<(), EconomyError> {
        self.require_owner(caller, "set_commission_bps")?;
        check_bps(bps)?;
        self.params.commission_bps = bps;
        self.tax_params_updated();
        Ok(())
    }

    pub fn set_tax_sink(&mut self, caller: &PlayerAddress, sink: TaxSink) -> Result<(), EconomyError> {
        self.require_owner(caller, "set_tax_sink")?;
        if let TaxSink::Treasury(addr) = sink {
            if addr.is_zero() {
                return Err(ValidationError::ZeroAddress.into());
            }
        }
        self.params.tax_sink = sink;
        self.tax_params_updated();
        Ok(())
    }

    fn tax_params_updated(&mut self) {
        self.dirty.meta = true;
        tracing::info!(
            base_tax_bps = self.params.base_tax_bps,
            commission_bps = self.params.commission_bps,
            tax_sink = ?self.params.tax_sink,
            "tax parameters updated"
        );
        self.events.emit(&EconomyEvent::TaxParamsUpdated {
            base_tax_bps: self.params.base_tax_bps,
            commission_bps: self.params.commission_bps,
            tax_sink: self.params.tax_sink,
        });
    }

    /// Applies to requests already pending: readiness is evaluated at claim time.
    pub fn set_unstake_cooldown_secs(
        &mut self,
        caller: &PlayerAddress,
        secs: u64,
    ) -> Result<(), EconomyError> {
        self.require_owner(caller, "set_unstake_cooldown_secs")?;
        self.params.unstake_cooldown_secs = secs;
        self.staking.set_cooldown_secs(secs);
        self.dirty.meta = true;
        tracing::info!(cooldown = %format_duration(secs), "unstake cooldown updated");
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &PlayerAddress,
        new_owner: &PlayerAddress,
    ) -> Result<(), EconomyError> {
        self.require_owner(caller, "transfer_ownership")?;
        if new_owner.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }
        let previous_owner = std::mem::replace(&mut self.owner, *new_owner);
        self.dirty.meta = true;
        tracing::info!(previous = %previous_owner, new = %new_owner, "ownership transferred");
        self.events.emit(&EconomyEvent::OwnershipTransferred {
            previous_owner,
            new_owner: *new_owner,
        });
        Ok(())
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn has_pending_writes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Every record touched since the last flush, as one batch.
    pub fn pending_batch(&self) -> Result<WriteBatch, StoreError> {
        let mut batch = WriteBatch::new();
        for player in &self.dirty.stakes {
            self.staking.stage(player, &mut batch);
        }
        for player in &self.dirty.usernames {
            self.directory.stage(player, &mut batch);
        }
        for player in &self.dirty.referrals {
            self.referrals.stage(player, &mut batch);
        }
        for player in &self.dirty.vaults {
            self.vault.stage(player, &mut batch);
        }
        if self.dirty.meta {
            batch.put_meta(META_PARAMS, encode_meta(&self.params)?);
            batch.put_meta(META_OWNER, encode_meta(&self.owner)?);
            batch.put_meta(
                META_COLLECTED_FEES,
                self.directory.collected_fees().to_be_bytes().to_vec(),
            );
            batch.put_schema_version();
        }
        Ok(batch)
    }

    /// Write all pending records in one batch. On failure nothing is cleared,
    /// so the next flush retries the same keys. Returns the number of writes.
    pub fn flush(&mut self, store: &dyn EconomyStore) -> Result<usize, StoreError> {
        if self.dirty.is_empty() {
            return Ok(0);
        }
        let batch = self.pending_batch()?;
        store.write_batch(&batch)?;
        self.dirty = DirtySet::default();
        tracing::debug!(writes = batch.len(), "flushed economy state");
        Ok(batch.len())
    }
}

fn encode_meta<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn read_meta<T: serde::de::DeserializeOwned>(
    store: &dyn EconomyStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get_meta(key)? {
        Some(bytes) => bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Serialization(format!("{key}: {e}"))),
        None => Ok(None),
    }
}
