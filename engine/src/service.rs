//! Actor wrapper around [`EconomyEngine`].
//!
//! One tokio task owns the engine and drains a bounded mailbox, so every
//! request is applied in arrival order with no locking. Callers talk to it
//! through a cloneable [`EconomyHandle`] and get results over `oneshot`.
//!
//! After each successful mutating command the task flushes the touched
//! records to the store before replying, so an acknowledged mutation is
//! durable unless the flush itself failed (see [`EconomyService::run`]).

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use stakevault_oracle::PriceConverter;
use stakevault_staking::{ClaimReceipt, StakeReceipt};
use stakevault_store::EconomyStore;
use stakevault_store_lmdb::LmdbEnvironment;
use stakevault_token::TokenLedger;
use stakevault_types::{
    Clock, EconomyError, EconomyParams, PendingUnstake, PlayerAddress, ReferralEdge, StakeState,
    TaxSink, Timestamp, TokenAmount, UsernameRecord, VaultAccount, VipTier,
};
use stakevault_vault::{TaxBreakdown, WithdrawalReceipt};
use stakevault_vip::VipStatus;

use crate::engine::Collaborators;
use crate::{EconomyConfig, EconomyEngine, EconomyMetrics, ServiceError};

/// What a job hands back: the outcome label for metrics and a deferred reply
/// that is only sent once the flush has run.
struct Completed {
    outcome: Result<(), &'static str>,
    reply: Box<dyn FnOnce() + Send>,
}

type Job = Box<dyn FnOnce(&mut EconomyEngine) -> Completed + Send>;

enum Command {
    Run {
        operation: &'static str,
        mutating: bool,
        job: Job,
    },
    Flush(oneshot::Sender<Result<usize, ServiceError>>),
    Shutdown(oneshot::Sender<()>),
}

pub struct EconomyService {
    engine: EconomyEngine,
    store: Option<Arc<dyn EconomyStore>>,
    metrics: Option<Arc<EconomyMetrics>>,
    rx: mpsc::Receiver<Command>,
}

impl EconomyService {
    pub fn new(
        mut engine: EconomyEngine,
        store: Option<Arc<dyn EconomyStore>>,
        metrics: Option<Arc<EconomyMetrics>>,
        capacity: usize,
    ) -> (Self, EconomyHandle) {
        if let Some(metrics) = &metrics {
            let metrics = Arc::clone(metrics);
            engine.subscribe(Box::new(move |event| {
                metrics.events.with_label_values(&[event.name()]).inc();
            }));
        }
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let service = Self {
            engine,
            store,
            metrics,
            rx,
        };
        (service, EconomyHandle { tx })
    }

    /// Build a service from configuration: open LMDB when a data directory
    /// is set, load or create the engine, wire metrics and event logging.
    pub fn from_config(
        config: &EconomyConfig,
        clock: Arc<dyn Clock>,
        token: Arc<dyn TokenLedger>,
    ) -> Result<(Self, EconomyHandle), ServiceError> {
        config.validate()?;
        let oracle: Arc<dyn PriceConverter> = Arc::new(config.price.converter()?);
        let deps = Collaborators {
            clock,
            oracle,
            token,
        };
        let params = config.economy_params();

        let store: Option<Arc<dyn EconomyStore>> = match &config.data_dir {
            Some(dir) => {
                let env = LmdbEnvironment::open(dir, config.map_size)
                    .map_err(stakevault_store::StoreError::from)?;
                tracing::info!(path = %dir.display(), "opened LMDB store");
                Some(Arc::new(env) as Arc<dyn EconomyStore>)
            }
            None => {
                tracing::warn!("no data_dir configured, economy state will not persist");
                None
            }
        };

        let mut engine = match &store {
            Some(store) => {
                EconomyEngine::load_from_store(store.as_ref(), params, config.owner, deps)?
            }
            None => EconomyEngine::new(params, config.owner, deps)?,
        };
        if config.log_events {
            engine.events_mut().log_events();
        }

        let metrics = config
            .enable_metrics
            .then(|| Arc::new(EconomyMetrics::new()));
        if let Some(metrics) = &metrics {
            metrics.observe_engine(&engine);
        }
        Ok(Self::new(engine, store, metrics, config.mailbox_capacity))
    }

    pub fn metrics(&self) -> Option<Arc<EconomyMetrics>> {
        self.metrics.clone()
    }

    /// Run the actor on the current runtime.
    pub fn spawn(self) -> JoinHandle<EconomyEngine> {
        tokio::spawn(self.run())
    }

    /// Process commands until shutdown or until every handle is dropped.
    ///
    /// A failed flush is logged and counted; the touched records stay
    /// pending and are retried by the next flush. The command's own result
    /// is still returned to the caller.
    pub async fn run(mut self) -> EconomyEngine {
        tracing::info!("economy service started");
        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Run {
                    operation,
                    mutating,
                    job,
                } => self.handle(operation, mutating, job),
                Command::Flush(reply) => {
                    let result = self.flush();
                    let _ = reply.send(result);
                }
                Command::Shutdown(reply) => {
                    self.flush_logged();
                    tracing::info!("economy service stopped");
                    let _ = reply.send(());
                    return self.engine;
                }
            }
        }
        self.flush_logged();
        tracing::info!("all handles dropped, economy service stopped");
        self.engine
    }

    fn handle(&mut self, operation: &'static str, mutating: bool, job: Job) {
        let started = Instant::now();
        let Completed { outcome, reply } = job(&mut self.engine);
        if mutating && outcome.is_ok() {
            self.flush_logged();
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_operation(operation, outcome.err().unwrap_or("ok"));
            metrics
                .command_time_ms
                .observe(started.elapsed().as_secs_f64() * 1_000.0);
            if mutating {
                metrics.observe_engine(&self.engine);
            }
        }
        if let Err(label) = outcome {
            tracing::debug!(operation, outcome = label, "command rejected");
        }
        reply();
    }

    fn flush(&mut self) -> Result<usize, ServiceError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let result = self.engine.flush(store.as_ref());
        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(0) => {}
                Ok(_) => metrics.batches_flushed.inc(),
                Err(_) => metrics.flush_failures.inc(),
            }
        }
        Ok(result?)
    }

    fn flush_logged(&mut self) {
        if let Err(e) = self.flush() {
            tracing::error!(error = %e, "failed to flush economy state, will retry");
        }
    }
}

/// Cloneable client for a running [`EconomyService`].
#[derive(Clone)]
pub struct EconomyHandle {
    tx: mpsc::Sender<Command>,
}

impl EconomyHandle {
    async fn submit<T, F>(
        &self,
        operation: &'static str,
        mutating: bool,
        f: F,
    ) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut EconomyEngine) -> (Result<(), &'static str>, T) + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |engine| {
            let (outcome, value) = f(engine);
            Completed {
                outcome,
                reply: Box::new(move || {
                    let _ = reply_tx.send(value);
                }),
            }
        });
        self.tx
            .send(Command::Run {
                operation,
                mutating,
                job,
            })
            .await
            .map_err(|_| ServiceError::MailboxClosed)?;
        reply_rx.await.map_err(|_| ServiceError::ReplyDropped)
    }

    /// Fallible command. `mutating` commands trigger a flush on success.
    async fn call<T, F>(
        &self,
        operation: &'static str,
        mutating: bool,
        f: F,
    ) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut EconomyEngine) -> Result<T, EconomyError> + Send + 'static,
    {
        let result = self
            .submit(operation, mutating, move |engine| {
                let result = f(engine);
                let outcome = result.as_ref().map(|_| ()).map_err(EconomyError::label);
                (outcome, result)
            })
            .await?;
        Ok(result?)
    }

    /// Infallible read.
    async fn read<T, F>(&self, operation: &'static str, f: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&EconomyEngine) -> T + Send + 'static,
    {
        self.submit(operation, false, move |engine| (Ok(()), f(engine)))
            .await
    }

    // ── Staking ─────────────────────────────────────────────────────────

    pub async fn stake(
        &self,
        player: PlayerAddress,
        amount: TokenAmount,
    ) -> Result<StakeReceipt, ServiceError> {
        self.call("stake", true, move |e| e.stake(&player, amount))
            .await
    }

    pub async fn request_unstake(
        &self,
        player: PlayerAddress,
        amount: TokenAmount,
    ) -> Result<PendingUnstake, ServiceError> {
        self.call("request_unstake", true, move |e| {
            e.request_unstake(&player, amount)
        })
        .await
    }

    pub async fn cancel_unstake(&self, player: PlayerAddress) -> Result<PendingUnstake, ServiceError> {
        self.call("cancel_unstake", true, move |e| e.cancel_unstake(&player))
            .await
    }

    pub async fn claim_unstaked(&self, player: PlayerAddress) -> Result<ClaimReceipt, ServiceError> {
        self.call("claim_unstaked", true, move |e| e.claim_unstaked(&player))
            .await
    }

    pub async fn staked_amount(&self, player: PlayerAddress) -> Result<TokenAmount, ServiceError> {
        self.read("staked_amount", move |e| e.staking().staked_amount(&player))
            .await
    }

    pub async fn stake_state(&self, player: PlayerAddress) -> Result<StakeState, ServiceError> {
        self.read("stake_state", move |e| e.staking().state(&player))
            .await
    }

    pub async fn pending_unstake(
        &self,
        player: PlayerAddress,
    ) -> Result<Option<PendingUnstake>, ServiceError> {
        self.read("pending_unstake", move |e| e.staking().pending_unstake(&player))
            .await
    }

    pub async fn unstake_ready_at(
        &self,
        player: PlayerAddress,
    ) -> Result<Option<Timestamp>, ServiceError> {
        self.read("unstake_ready_at", move |e| {
            e.staking().unstake_ready_at(&player)
        })
        .await
    }

    pub async fn total_staked(&self) -> Result<TokenAmount, ServiceError> {
        self.read("total_staked", |e| e.staking().total_staked())
            .await
    }

    // ── VIP ─────────────────────────────────────────────────────────────

    pub async fn vip_status(&self, player: PlayerAddress) -> Result<VipStatus, ServiceError> {
        self.call("vip_status", false, move |e| e.vip_status(&player))
            .await
    }

    pub async fn vip_tier(&self, player: PlayerAddress) -> Result<VipTier, ServiceError> {
        self.call("vip_tier", false, move |e| e.vip_tier(&player))
            .await
    }

    pub async fn tax_reduction_bps(&self, player: PlayerAddress) -> Result<u32, ServiceError> {
        self.call("tax_reduction_bps", false, move |e| {
            e.tax_reduction_bps(&player)
        })
        .await
    }

    pub async fn effective_tax_bps(&self, player: PlayerAddress) -> Result<u32, ServiceError> {
        self.call("effective_tax_bps", false, move |e| {
            e.effective_tax_bps(&player)
        })
        .await
    }

    // ── Usernames & referrals ───────────────────────────────────────────

    pub async fn register_username(
        &self,
        caller: PlayerAddress,
        name: impl Into<String>,
        fee_paid: u128,
    ) -> Result<UsernameRecord, ServiceError> {
        let name = name.into();
        self.call("register_username", true, move |e| {
            e.register_username(&caller, &name, fee_paid)
        })
        .await
    }

    pub async fn resolve_username(
        &self,
        name: impl Into<String>,
    ) -> Result<Option<PlayerAddress>, ServiceError> {
        let name = name.into();
        self.read("resolve_username", move |e| {
            e.directory().resolve_username(&name)
        })
        .await
    }

    pub async fn get_user_username(
        &self,
        player: PlayerAddress,
    ) -> Result<Option<String>, ServiceError> {
        self.read("get_user_username", move |e| {
            e.directory().get_user_username(&player).map(str::to_string)
        })
        .await
    }

    pub async fn is_username_available(
        &self,
        name: impl Into<String>,
    ) -> Result<bool, ServiceError> {
        let name = name.into();
        self.read("is_username_available", move |e| {
            e.directory().is_username_available(&name)
        })
        .await
    }

    pub async fn registration_fee(&self) -> Result<u128, ServiceError> {
        self.read("registration_fee", |e| e.directory().registration_fee())
            .await
    }

    pub async fn collected_fees(&self) -> Result<u128, ServiceError> {
        self.read("collected_fees", |e| e.directory().collected_fees())
            .await
    }

    pub async fn set_referrer(
        &self,
        caller: PlayerAddress,
        referrer: PlayerAddress,
    ) -> Result<ReferralEdge, ServiceError> {
        self.call("set_referrer", true, move |e| {
            e.set_referrer(&caller, &referrer)
        })
        .await
    }

    pub async fn set_referrer_by_username(
        &self,
        caller: PlayerAddress,
        name: impl Into<String>,
    ) -> Result<ReferralEdge, ServiceError> {
        let name = name.into();
        self.call("set_referrer_by_username", true, move |e| {
            e.set_referrer_by_username(&caller, &name)
        })
        .await
    }

    pub async fn referrer_of(
        &self,
        player: PlayerAddress,
    ) -> Result<Option<PlayerAddress>, ServiceError> {
        self.read("referrer_of", move |e| e.referrals().referrer_of(&player))
            .await
    }

    pub async fn referees_of(
        &self,
        referrer: PlayerAddress,
    ) -> Result<Vec<PlayerAddress>, ServiceError> {
        self.read("referees_of", move |e| e.referrals().referees_of(&referrer))
            .await
    }

    // ── Vault ───────────────────────────────────────────────────────────

    pub async fn deposit(
        &self,
        player: PlayerAddress,
        amount: TokenAmount,
    ) -> Result<VaultAccount, ServiceError> {
        self.call("deposit", true, move |e| e.deposit(&player, amount))
            .await
    }

    pub async fn withdraw(
        &self,
        player: PlayerAddress,
        amount: TokenAmount,
    ) -> Result<WithdrawalReceipt, ServiceError> {
        self.call("withdraw", true, move |e| e.withdraw(&player, amount))
            .await
    }

    pub async fn quote_withdrawal(
        &self,
        player: PlayerAddress,
        amount: TokenAmount,
    ) -> Result<TaxBreakdown, ServiceError> {
        self.call("quote_withdrawal", false, move |e| {
            e.quote_withdrawal(&player, amount)
        })
        .await
    }

    pub async fn vault_balance(&self, player: PlayerAddress) -> Result<TokenAmount, ServiceError> {
        self.read("vault_balance", move |e| e.vault().balance(&player))
            .await
    }

    pub async fn vault_account(
        &self,
        player: PlayerAddress,
    ) -> Result<Option<VaultAccount>, ServiceError> {
        self.read("vault_account", move |e| e.vault().account(&player).cloned())
            .await
    }

    pub async fn total_balances(&self) -> Result<TokenAmount, ServiceError> {
        self.read("total_balances", |e| e.vault().total_balances())
            .await
    }

    // ── Administration ──────────────────────────────────────────────────

    pub async fn owner(&self) -> Result<PlayerAddress, ServiceError> {
        self.read("owner", |e| e.owner()).await
    }

    pub async fn params(&self) -> Result<EconomyParams, ServiceError> {
        self.read("params", |e| e.params().clone()).await
    }

    pub async fn set_registration_fee(
        &self,
        caller: PlayerAddress,
        new_fee: u128,
    ) -> Result<(), ServiceError> {
        self.call("set_registration_fee", true, move |e| {
            e.set_registration_fee(&caller, new_fee)
        })
        .await
    }

    pub async fn withdraw_fees(&self, caller: PlayerAddress) -> Result<u128, ServiceError> {
        self.call("withdraw_fees", true, move |e| e.withdraw_fees(&caller))
            .await
    }

    pub async fn set_base_tax_bps(&self, caller: PlayerAddress, bps: u32) -> Result<(), ServiceError> {
        self.call("set_base_tax_bps", true, move |e| {
            e.set_base_tax_bps(&caller, bps)
        })
        .await
    }

    pub async fn set_commission_bps(
        &self,
        caller: PlayerAddress,
        bps: u32,
    ) -> Result<(), ServiceError> {
        self.call("set_commission_bps", true, move |e| {
            e.set_commission_bps(&caller, bps)
        })
        .await
    }

    pub async fn set_tax_sink(&self, caller: PlayerAddress, sink: TaxSink) -> Result<(), ServiceError> {
        self.call("set_tax_sink", true, move |e| e.set_tax_sink(&caller, sink))
            .await
    }

    pub async fn set_unstake_cooldown_secs(
        &self,
        caller: PlayerAddress,
        secs: u64,
    ) -> Result<(), ServiceError> {
        self.call("set_unstake_cooldown_secs", true, move |e| {
            e.set_unstake_cooldown_secs(&caller, secs)
        })
        .await
    }

    pub async fn transfer_ownership(
        &self,
        caller: PlayerAddress,
        new_owner: PlayerAddress,
    ) -> Result<(), ServiceError> {
        self.call("transfer_ownership", true, move |e| {
            e.transfer_ownership(&caller, &new_owner)
        })
        .await
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Force a flush. Returns the number of writes.
    pub async fn flush(&self) -> Result<usize, ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply_tx))
            .await
            .map_err(|_| ServiceError::MailboxClosed)?;
        reply_rx.await.map_err(|_| ServiceError::ReplyDropped)?
    }

    /// Flush and stop the service. Commands queued behind this one fail
    /// with [`ServiceError::ReplyDropped`].
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Shutdown(reply_tx))
            .await
            .map_err(|_| ServiceError::MailboxClosed)?;
        reply_rx.await.map_err(|_| ServiceError::ReplyDropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakevault_nullables::{NullClock, NullPriceConverter, NullStore, NullTokenLedger};
    use stakevault_types::{ErrorCategory, ValidationError};

    fn addr(n: u8) -> PlayerAddress {
        PlayerAddress::new([n; 20])
    }

    fn owner() -> PlayerAddress {
        addr(0xaa)
    }

    fn engine(token: Arc<NullTokenLedger>) -> EconomyEngine {
        let deps = Collaborators {
            clock: Arc::new(NullClock::new(1_000)),
            oracle: Arc::new(NullPriceConverter::new()),
            token,
        };
        EconomyEngine::new(EconomyParams::default(), owner(), deps).unwrap()
    }

    fn funded_token() -> Arc<NullTokenLedger> {
        let token = Arc::new(NullTokenLedger::new());
        token.fund(&addr(1), 1_000_000);
        token
    }

    #[tokio::test]
    async fn test_commands_are_answered_in_order() {
        let (service, handle) = EconomyService::new(engine(funded_token()), None, None, 8);
        let task = service.spawn();

        handle.stake(addr(1), TokenAmount::new(400)).await.unwrap();
        assert_eq!(handle.vip_tier(addr(1)).await.unwrap(), VipTier::new(2));
        assert_eq!(
            handle.staked_amount(addr(1)).await.unwrap(),
            TokenAmount::new(400)
        );

        handle.shutdown().await.unwrap();
        let engine = task.await.unwrap();
        assert_eq!(engine.staking().total_staked(), TokenAmount::new(400));
    }

    #[tokio::test]
    async fn test_errors_come_back_typed() {
        let (service, handle) = EconomyService::new(engine(funded_token()), None, None, 8);
        service.spawn();

        let err = handle.stake(addr(1), TokenAmount::ZERO).await.unwrap_err();
        assert_eq!(
            err.as_economy(),
            Some(&EconomyError::Validation(ValidationError::ZeroAmount))
        );
        let err = handle.withdraw_fees(addr(2)).await.unwrap_err();
        assert_eq!(
            err.as_economy().map(EconomyError::category),
            Some(ErrorCategory::Authorization)
        );
    }

    #[tokio::test]
    async fn test_successful_mutations_are_flushed() {
        let store = Arc::new(NullStore::new());
        let (service, handle) = EconomyService::new(
            engine(funded_token()),
            Some(store.clone() as Arc<dyn EconomyStore>),
            None,
            8,
        );
        service.spawn();

        handle.stake(addr(1), TokenAmount::new(10)).await.unwrap();
        assert_eq!(store.batches_written(), 1);

        // Rejected and read-only commands do not write.
        let _ = handle.stake(addr(1), TokenAmount::ZERO).await;
        handle.total_staked().await.unwrap();
        assert_eq!(store.batches_written(), 1);
        assert_eq!(handle.flush().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_flush_is_retried() {
        let store = Arc::new(NullStore::new());
        let metrics = Arc::new(EconomyMetrics::new());
        let (service, handle) = EconomyService::new(
            engine(funded_token()),
            Some(store.clone() as Arc<dyn EconomyStore>),
            Some(metrics.clone()),
            8,
        );
        service.spawn();

        store.set_fail_writes(true);
        // The command itself succeeded; only persistence lagged.
        handle.stake(addr(1), TokenAmount::new(10)).await.unwrap();
        assert_eq!(metrics.flush_failures.get(), 1);
        assert!(handle.flush().await.is_err());

        store.set_fail_writes(false);
        assert!(handle.flush().await.unwrap() > 0);
        assert_eq!(metrics.batches_flushed.get(), 1);
    }

    #[tokio::test]
    async fn test_metrics_track_operations_and_events() {
        let metrics = Arc::new(EconomyMetrics::new());
        let (service, handle) =
            EconomyService::new(engine(funded_token()), None, Some(metrics.clone()), 8);
        service.spawn();

        handle.register_username(addr(1), "alice", 0).await.unwrap();
        let _ = handle.register_username(addr(2), "alice", 0).await;
        handle.stake(addr(1), TokenAmount::new(100)).await.unwrap();

        let ops = &metrics.operations;
        assert_eq!(ops.with_label_values(&["register_username", "ok"]).get(), 1);
        assert_eq!(ops.with_label_values(&["register_username", "state"]).get(), 1);
        assert_eq!(
            metrics.events.with_label_values(&["vip_level_changed"]).get(),
            1
        );
        assert_eq!(metrics.username_count.get(), 1);
        assert_eq!(metrics.staker_count.get(), 1);
    }

    #[tokio::test]
    async fn test_closed_service_reports_mailbox_closed() {
        let (service, handle) = EconomyService::new(engine(funded_token()), None, None, 1);
        let task = service.spawn();
        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert!(matches!(
            handle.total_staked().await,
            Err(ServiceError::MailboxClosed)
        ));
    }

    #[tokio::test]
    async fn test_handles_dropped_stops_service() {
        let (service, handle) = EconomyService::new(engine(funded_token()), None, None, 4);
        let task = service.spawn();
        handle.deposit(addr(1), TokenAmount::new(5)).await.unwrap();
        drop(handle);
        let engine = task.await.unwrap();
        assert_eq!(engine.vault().balance(&addr(1)), TokenAmount::new(5));
    }
}
