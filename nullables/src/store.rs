//! Nullable store: thread-safe in-memory storage for testing.

use stakevault_store::{
    BatchWriter, MetaStore, ReferralStore, StakeStore, StoreError, StoreOp, UsernameStore,
    VaultStore, WriteBatch,
};
use stakevault_types::{PlayerAddress, ReferralEdge, StakePosition, UsernameRecord, VaultAccount};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    stakes: BTreeMap<PlayerAddress, StakePosition>,
    usernames_by_owner: BTreeMap<PlayerAddress, UsernameRecord>,
    usernames_by_name: HashMap<String, UsernameRecord>,
    referrals: BTreeMap<PlayerAddress, ReferralEdge>,
    vaults: BTreeMap<PlayerAddress, VaultAccount>,
    meta: HashMap<String, Vec<u8>>,
}

/// An in-memory economy store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
    batches_written: AtomicUsize,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent batch fail without applying anything.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of batches committed so far.
    pub fn batches_written(&self) -> usize {
        self.batches_written.load(Ordering::SeqCst)
    }
}

impl StakeStore for NullStore {
    fn get_stake(&self, owner: &PlayerAddress) -> Result<Option<StakePosition>, StoreError> {
        Ok(self.tables.lock().unwrap().stakes.get(owner).cloned())
    }

    fn iter_stakes(&self) -> Result<Vec<StakePosition>, StoreError> {
        Ok(self.tables.lock().unwrap().stakes.values().cloned().collect())
    }
}

impl UsernameStore for NullStore {
    fn get_username_by_owner(
        &self,
        owner: &PlayerAddress,
    ) -> Result<Option<UsernameRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .usernames_by_owner
            .get(owner)
            .cloned())
    }

    fn get_username_by_name(&self, name: &str) -> Result<Option<UsernameRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .usernames_by_name
            .get(name)
            .cloned())
    }

    fn iter_usernames(&self) -> Result<Vec<UsernameRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .usernames_by_owner
            .values()
            .cloned()
            .collect())
    }
}

impl ReferralStore for NullStore {
    fn get_referral(&self, referee: &PlayerAddress) -> Result<Option<ReferralEdge>, StoreError> {
        Ok(self.tables.lock().unwrap().referrals.get(referee).copied())
    }

    fn iter_referrals(&self) -> Result<Vec<ReferralEdge>, StoreError> {
        Ok(self.tables.lock().unwrap().referrals.values().copied().collect())
    }
}

impl VaultStore for NullStore {
    fn get_vault(&self, owner: &PlayerAddress) -> Result<Option<VaultAccount>, StoreError> {
        Ok(self.tables.lock().unwrap().vaults.get(owner).cloned())
    }

    fn iter_vaults(&self) -> Result<Vec<VaultAccount>, StoreError> {
        Ok(self.tables.lock().unwrap().vaults.values().cloned().collect())
    }
}

impl MetaStore for NullStore {
    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.tables.lock().unwrap().meta.get(key).cloned())
    }
}

impl BatchWriter for NullStore {
    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null store writes switched off".into()));
        }
        let mut tables = self.tables.lock().unwrap();
        for op in batch.ops() {
            match op {
                StoreOp::PutStake(position) => {
                    tables.stakes.insert(position.owner, position.clone());
                }
                StoreOp::PutUsername(record) => {
                    tables
                        .usernames_by_owner
                        .insert(record.owner, record.clone());
                    tables
                        .usernames_by_name
                        .insert(record.name.clone(), record.clone());
                }
                StoreOp::PutReferral(edge) => {
                    tables.referrals.insert(edge.referee, *edge);
                }
                StoreOp::PutVault(account) => {
                    tables.vaults.insert(account.owner, account.clone());
                }
                StoreOp::PutMeta { key, value } => {
                    tables.meta.insert(key.clone(), value.clone());
                }
            }
        }
        self.batches_written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
