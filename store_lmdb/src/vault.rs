use stakevault_store::{StoreError, VaultStore};
use stakevault_types::{PlayerAddress, VaultAccount};

use crate::LmdbEnvironment;

impl VaultStore for LmdbEnvironment {
    fn get_vault(&self, owner: &PlayerAddress) -> Result<Option<VaultAccount>, StoreError> {
        self.get_record(self.vaults_db, owner.as_bytes())
    }

    fn iter_vaults(&self) -> Result<Vec<VaultAccount>, StoreError> {
        self.iter_records(self.vaults_db)
    }
}
