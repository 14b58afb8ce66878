//! Username storage trait: the only table with two keys.

use crate::StoreError;
use stakevault_types::{PlayerAddress, UsernameRecord};

pub trait UsernameStore {
    fn get_username_by_owner(
        &self,
        owner: &PlayerAddress,
    ) -> Result<Option<UsernameRecord>, StoreError>;
    fn get_username_by_name(&self, name: &str) -> Result<Option<UsernameRecord>, StoreError>;
    fn iter_usernames(&self) -> Result<Vec<UsernameRecord>, StoreError>;
}
