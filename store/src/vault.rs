use crate::StoreError;
use stakevault_types::{PlayerAddress, VaultAccount};

pub trait VaultStore {
    fn get_vault(&self, owner: &PlayerAddress) -> Result<Option<VaultAccount>, StoreError>;
    fn iter_vaults(&self) -> Result<Vec<VaultAccount>, StoreError>;
}
