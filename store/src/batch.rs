//! Atomic write batches.
//!
//! The engine never writes records one at a time: every mutation collects
//! its dirty records into a [`WriteBatch`] and the backend applies the whole
//! batch in one transaction, or none of it.

use crate::meta::{SCHEMA_VERSION, SCHEMA_VERSION_KEY};
use crate::StoreError;
use stakevault_types::{ReferralEdge, StakePosition, UsernameRecord, VaultAccount};

/// One write inside a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOp {
    PutStake(StakePosition),
    /// Written under both the owner key and the name key.
    PutUsername(UsernameRecord),
    PutReferral(ReferralEdge),
    PutVault(VaultAccount),
    PutMeta { key: String, value: Vec<u8> },
}

/// An ordered group of writes applied atomically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<StoreOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: StoreOp) {
        self.ops.push(op);
    }

    pub fn put_stake(&mut self, position: StakePosition) {
        self.push(StoreOp::PutStake(position));
    }

    pub fn put_username(&mut self, record: UsernameRecord) {
        self.push(StoreOp::PutUsername(record));
    }

    pub fn put_referral(&mut self, edge: ReferralEdge) {
        self.push(StoreOp::PutReferral(edge));
    }

    pub fn put_vault(&mut self, account: VaultAccount) {
        self.push(StoreOp::PutVault(account));
    }

    pub fn put_meta(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.push(StoreOp::PutMeta {
            key: key.into(),
            value,
        });
    }

    /// Stamp the batch with the current schema version.
    pub fn put_schema_version(&mut self) {
        self.put_meta(SCHEMA_VERSION_KEY, SCHEMA_VERSION.to_be_bytes().to_vec());
    }

    pub fn ops(&self) -> &[StoreOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Applies a [`WriteBatch`] all-or-nothing.
pub trait BatchWriter {
    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakevault_types::{PlayerAddress, Timestamp};

    #[test]
    fn batch_preserves_order() {
        let owner = PlayerAddress::new([1; 20]);
        let mut batch = WriteBatch::new();
        assert!(batch.is_empty());
        batch.put_vault(VaultAccount::new(owner));
        batch.put_stake(StakePosition::new(owner, Timestamp::new(1)));
        batch.put_schema_version();
        assert_eq!(batch.len(), 3);
        assert!(matches!(batch.ops()[0], StoreOp::PutVault(_)));
        assert!(matches!(batch.ops()[1], StoreOp::PutStake(_)));
        assert!(matches!(&batch.ops()[2], StoreOp::PutMeta { key, .. } if key == SCHEMA_VERSION_KEY));
    }
}
