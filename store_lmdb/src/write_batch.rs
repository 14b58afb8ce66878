//! Write batching: applies a [`WriteBatch`] inside a single LMDB write
//! transaction.
//!
//! If any put fails the transaction is dropped without commit, so LMDB
//! aborts it and none of the batch becomes visible.

use stakevault_store::{BatchWriter, StoreError, StoreOp, WriteBatch};

use crate::codec::encode;
use crate::{LmdbEnvironment, LmdbError};

impl BatchWriter for LmdbEnvironment {
    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut txn = self.env().write_txn().map_err(LmdbError::from)?;

        for op in batch.ops() {
            match op {
                StoreOp::PutStake(position) => {
                    self.stakes_db
                        .put(&mut txn, position.owner.as_bytes(), &encode(position)?)
                        .map_err(LmdbError::from)?;
                }
                StoreOp::PutUsername(record) => {
                    let bytes = encode(record)?;
                    self.usernames_by_owner_db
                        .put(&mut txn, record.owner.as_bytes(), &bytes)
                        .map_err(LmdbError::from)?;
                    self.usernames_by_name_db
                        .put(&mut txn, record.name.as_bytes(), &bytes)
                        .map_err(LmdbError::from)?;
                }
                StoreOp::PutReferral(edge) => {
                    self.referrals_db
                        .put(&mut txn, edge.referee.as_bytes(), &encode(edge)?)
                        .map_err(LmdbError::from)?;
                }
                StoreOp::PutVault(account) => {
                    self.vaults_db
                        .put(&mut txn, account.owner.as_bytes(), &encode(account)?)
                        .map_err(LmdbError::from)?;
                }
                StoreOp::PutMeta { key, value } => {
                    self.meta_db
                        .put(&mut txn, key.as_bytes(), value)
                        .map_err(LmdbError::from)?;
                }
            }
        }

        txn.commit().map_err(LmdbError::from)?;
        tracing::debug!(ops = batch.len(), "committed write batch");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakevault_store::{MetaStore, ReferralStore, StakeStore, UsernameStore, VaultStore};
    use stakevault_types::{
        PendingUnstake, PlayerAddress, ReferralEdge, StakePosition, Timestamp, TokenAmount,
        UsernameRecord, VaultAccount, VipTier,
    };

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).expect("open env");
        (dir, env)
    }

    fn addr(n: u8) -> PlayerAddress {
        PlayerAddress::new([n; 20])
    }

    #[test]
    fn batch_writes_every_table() {
        let (_dir, env) = temp_env();
        let alice = addr(1);
        let bob = addr(2);

        let mut position = StakePosition::new(alice, Timestamp::new(10));
        position.staked_amount = TokenAmount::new(500);
        position.vip_tier = VipTier::new(2);
        position.pending_unstake = Some(PendingUnstake {
            amount: TokenAmount::new(100),
            requested_at: Timestamp::new(20),
        });

        let name = UsernameRecord {
            name: "alice123".into(),
            owner: alice,
            registered_at: Timestamp::new(11),
        };
        let edge = ReferralEdge {
            referee: bob,
            referrer: alice,
            created_at: Timestamp::new(12),
        };
        let mut vault = VaultAccount::new(bob);
        vault.balance = TokenAmount::new(77);

        let mut batch = WriteBatch::new();
        batch.put_stake(position.clone());
        batch.put_username(name.clone());
        batch.put_referral(edge);
        batch.put_vault(vault.clone());
        batch.put_schema_version();
        env.write_batch(&batch).unwrap();

        assert_eq!(env.get_stake(&alice).unwrap(), Some(position));
        assert_eq!(env.get_username_by_owner(&alice).unwrap(), Some(name.clone()));
        assert_eq!(env.get_username_by_name("alice123").unwrap(), Some(name));
        assert_eq!(env.get_referral(&bob).unwrap(), Some(edge));
        assert_eq!(env.get_vault(&bob).unwrap(), Some(vault));
        assert_eq!(env.get_schema_version().unwrap(), Some(1));
    }

    #[test]
    fn missing_keys_read_as_none() {
        let (_dir, env) = temp_env();
        assert_eq!(env.get_stake(&addr(9)).unwrap(), None);
        assert_eq!(env.get_username_by_name("nobody").unwrap(), None);
        assert_eq!(env.get_meta("params").unwrap(), None);
        assert_eq!(env.get_schema_version().unwrap(), None);
    }

    #[test]
    fn later_puts_overwrite_earlier_ones() {
        let (_dir, env) = temp_env();
        let owner = addr(3);
        let mut vault = VaultAccount::new(owner);

        let mut batch = WriteBatch::new();
        batch.put_vault(vault.clone());
        vault.balance = TokenAmount::new(5);
        batch.put_vault(vault.clone());
        env.write_batch(&batch).unwrap();

        assert_eq!(env.get_vault(&owner).unwrap().unwrap().balance, TokenAmount::new(5));
        assert_eq!(env.iter_vaults().unwrap().len(), 1);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let owner = addr(4);
        {
            let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
            let mut batch = WriteBatch::new();
            batch.put_stake(StakePosition::new(owner, Timestamp::new(1)));
            env.write_batch(&batch).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        assert_eq!(env.iter_stakes().unwrap().len(), 1);
        assert!(env.get_stake(&owner).unwrap().is_some());
    }
}
