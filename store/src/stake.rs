//! Stake position storage trait.

use crate::StoreError;
use stakevault_types::{PlayerAddress, StakePosition};

pub trait StakeStore {
    fn get_stake(&self, owner: &PlayerAddress) -> Result<Option<StakePosition>, StoreError>;
    fn iter_stakes(&self) -> Result<Vec<StakePosition>, StoreError>;
}
