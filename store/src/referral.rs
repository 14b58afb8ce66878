use crate::StoreError;
use stakevault_types::{PlayerAddress, ReferralEdge};

pub trait ReferralStore {
    fn get_referral(&self, referee: &PlayerAddress) -> Result<Option<ReferralEdge>, StoreError>;
    fn iter_referrals(&self) -> Result<Vec<ReferralEdge>, StoreError>;
}
