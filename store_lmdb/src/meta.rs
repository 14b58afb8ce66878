use stakevault_store::{MetaStore, StoreError};

use crate::{LmdbEnvironment, LmdbError};

impl MetaStore for LmdbEnvironment {
    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let txn = self.read_txn()?;
        let value = self
            .meta_db
            .get(&txn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(value.map(|bytes| bytes.to_vec()))
    }
}
