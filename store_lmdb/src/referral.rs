use stakevault_store::{ReferralStore, StoreError};
use stakevault_types::{PlayerAddress, ReferralEdge};

use crate::LmdbEnvironment;

impl ReferralStore for LmdbEnvironment {
    fn get_referral(&self, referee: &PlayerAddress) -> Result<Option<ReferralEdge>, StoreError> {
        self.get_record(self.referrals_db, referee.as_bytes())
    }

    fn iter_referrals(&self) -> Result<Vec<ReferralEdge>, StoreError> {
        self.iter_records(self.referrals_db)
    }
}
