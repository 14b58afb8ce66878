use stakevault_store::{StoreError, UsernameStore};
use stakevault_types::{PlayerAddress, UsernameRecord};

use crate::LmdbEnvironment;

impl UsernameStore for LmdbEnvironment {
    fn get_username_by_owner(
        &self,
        owner: &PlayerAddress,
    ) -> Result<Option<UsernameRecord>, StoreError> {
        self.get_record(self.usernames_by_owner_db, owner.as_bytes())
    }

    fn get_username_by_name(&self, name: &str) -> Result<Option<UsernameRecord>, StoreError> {
        self.get_record(self.usernames_by_name_db, name.as_bytes())
    }

    fn iter_usernames(&self) -> Result<Vec<UsernameRecord>, StoreError> {
        self.iter_records(self.usernames_by_owner_db)
    }
}
