use stakevault_store::{StakeStore, StoreError};
use stakevault_types::{PlayerAddress, StakePosition};

use crate::LmdbEnvironment;

impl StakeStore for LmdbEnvironment {
    fn get_stake(&self, owner: &PlayerAddress) -> Result<Option<StakePosition>, StoreError> {
        self.get_record(self.stakes_db, owner.as_bytes())
    }

    fn iter_stakes(&self) -> Result<Vec<StakePosition>, StoreError> {
        self.iter_records(self.stakes_db)
    }
}
