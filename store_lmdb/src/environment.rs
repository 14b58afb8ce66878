//! LMDB environment setup.

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn};
use serde::de::DeserializeOwned;
use stakevault_store::StoreError;
use std::path::Path;

use crate::codec::decode;
use crate::LmdbError;

/// Number of named databases opened in the environment.
const MAX_DBS: u32 = 8;

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Env,
    /// owner address → StakePosition
    pub(crate) stakes_db: Database<Bytes, Bytes>,
    /// owner address → UsernameRecord
    pub(crate) usernames_by_owner_db: Database<Bytes, Bytes>,
    /// name bytes → UsernameRecord
    pub(crate) usernames_by_name_db: Database<Bytes, Bytes>,
    /// referee address → ReferralEdge
    pub(crate) referrals_db: Database<Bytes, Bytes>,
    /// owner address → VaultAccount
    pub(crate) vaults_db: Database<Bytes, Bytes>,
    /// string key → opaque bytes
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per path by this process and
        // the file is not modified by anything outside LMDB.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let stakes_db = env.create_database(&mut wtxn, Some("stakes"))?;
        let usernames_by_owner_db = env.create_database(&mut wtxn, Some("usernames_by_owner"))?;
        let usernames_by_name_db = env.create_database(&mut wtxn, Some("usernames_by_name"))?;
        let referrals_db = env.create_database(&mut wtxn, Some("referrals"))?;
        let vaults_db = env.create_database(&mut wtxn, Some("vaults"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env,
            stakes_db,
            usernames_by_owner_db,
            usernames_by_name_db,
            referrals_db,
            vaults_db,
            meta_db,
        })
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }

    pub(crate) fn read_txn(&self) -> Result<RoTxn<'_>, LmdbError> {
        Ok(self.env.read_txn()?)
    }
}

impl LmdbEnvironment {
    /// Read and decode one record.
    pub(crate) fn get_record<T: DeserializeOwned>(
        &self,
        db: Database<Bytes, Bytes>,
        key: &[u8],
    ) -> Result<Option<T>, StoreError> {
        let txn = self.read_txn()?;
        match db.get(&txn, key).map_err(LmdbError::from)? {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    /// Decode every record in a database, in key order.
    pub(crate) fn iter_records<T: DeserializeOwned>(
        &self,
        db: Database<Bytes, Bytes>,
    ) -> Result<Vec<T>, StoreError> {
        let txn = self.read_txn()?;
        let mut results = Vec::new();
        for item in db.iter(&txn).map_err(LmdbError::from)? {
            let (_, bytes) = item.map_err(LmdbError::from)?;
            results.push(decode(bytes)?);
        }
        Ok(results)
    }
}
