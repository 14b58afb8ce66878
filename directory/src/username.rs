//! Username registry.
//!
//! Names are 3 to 20 ASCII letters, digits or underscores, case-sensitive,
//! and may not begin with the raw-address prefix. A name and its owner are
//! bound for good once registered.

use std::collections::HashMap;

use stakevault_store::{StoreError, UsernameStore, WriteBatch};
use stakevault_types::{
    EconomyError, PlayerAddress, StateError, Timestamp, UsernameRecord, ValidationError,
};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 20;

/// Check a candidate name against the format rules.
pub fn validate_username(name: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &'static str| ValidationError::InvalidUsername {
        name: name.to_string(),
        reason,
    };
    if name.len() < MIN_USERNAME_LEN {
        return Err(invalid("shorter than 3 characters"));
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(invalid("longer than 20 characters"));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    {
        return Err(invalid("only letters, digits and underscores are allowed"));
    }
    if PlayerAddress::is_address_like(name) {
        return Err(invalid("reserved address prefix"));
    }
    Ok(())
}

/// Bidirectional name ↔ address registry plus the fees it has taken in.
#[derive(Debug, Default)]
pub struct UsernameDirectory {
    by_name: HashMap<String, UsernameRecord>,
    by_owner: HashMap<PlayerAddress, String>,
    registration_fee: u128,
    collected_fees: u128,
}

impl UsernameDirectory {
    pub fn new(registration_fee: u128) -> Self {
        Self {
            registration_fee,
            ..Self::default()
        }
    }

    /// Bind `name` to `caller`. The whole `fee_paid` is retained, overpayment included.
    pub fn register_username(
        &mut self,
        caller: &PlayerAddress,
        name: &str,
        fee_paid: u128,
        now: Timestamp,
    ) -> Result<UsernameRecord, EconomyError> {
        if caller.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }
        validate_username(name)?;
        if fee_paid < self.registration_fee {
            return Err(ValidationError::InsufficientFee {
                paid: fee_paid,
                required: self.registration_fee,
            }
            .into());
        }
        if let Some(existing) = self.by_owner.get(caller) {
            return Err(StateError::AlreadyHasUsername(existing.clone()).into());
        }
        if self.by_name.contains_key(name) {
            return Err(StateError::UsernameTaken(name.to_string()).into());
        }
        let collected = self
            .collected_fees
            .checked_add(fee_paid)
            .ok_or(ValidationError::Overflow)?;

        let record = UsernameRecord {
            name: name.to_string(),
            owner: *caller,
            registered_at: now,
        };
        self.by_name.insert(record.name.clone(), record.clone());
        self.by_owner.insert(*caller, record.name.clone());
        self.collected_fees = collected;

        tracing::info!(player = %caller, name, fee_paid, "username registered");
        Ok(record)
    }

    pub fn resolve_username(&self, name: &str) -> Option<PlayerAddress> {
        self.by_name.get(name).map(|r| r.owner)
    }

    pub fn get_user_username(&self, player: &PlayerAddress) -> Option<&str> {
        self.by_owner.get(player).map(String::as_str)
    }

    pub fn record_of(&self, player: &PlayerAddress) -> Option<&UsernameRecord> {
        self.by_owner.get(player).and_then(|n| self.by_name.get(n))
    }

    /// False for taken names and for names that would fail validation.
    pub fn is_username_available(&self, name: &str) -> bool {
        validate_username(name).is_ok() && !self.by_name.contains_key(name)
    }

    pub fn registration_fee(&self) -> u128 {
        self.registration_fee
    }

    /// Returns the previous fee.
    pub fn set_registration_fee(&mut self, fee: u128) -> u128 {
        let old = std::mem::replace(&mut self.registration_fee, fee);
        tracing::info!(old_fee = old, new_fee = fee, "registration fee updated");
        old
    }

    pub fn collected_fees(&self) -> u128 {
        self.collected_fees
    }

    /// Sweep everything collected so far. Returns the swept amount.
    pub fn withdraw_fees(&mut self) -> u128 {
        let swept = std::mem::take(&mut self.collected_fees);
        tracing::info!(amount = swept, "registration fees withdrawn");
        swept
    }

    pub fn registered_count(&self) -> usize {
        self.by_name.len()
    }

    pub fn stage(&self, player: &PlayerAddress, batch: &mut WriteBatch) {
        if let Some(record) = self.record_of(player) {
            batch.put_username(record.clone());
        }
    }

    /// Rebuild from storage. Fee settings live in the meta table and are passed in.
    pub fn load_from_store<S: UsernameStore + ?Sized>(
        store: &S,
        registration_fee: u128,
        collected_fees: u128,
    ) -> Result<Self, StoreError> {
        let mut directory = Self::new(registration_fee);
        directory.collected_fees = collected_fees;
        for record in store.iter_usernames()? {
            if directory.by_owner.contains_key(&record.owner) {
                return Err(StoreError::Corruption(format!(
                    "{} owns more than one username",
                    record.owner
                )));
            }
            directory.by_owner.insert(record.owner, record.name.clone());
            directory.by_name.insert(record.name.clone(), record);
        }
        Ok(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> PlayerAddress {
        PlayerAddress::new([n; 20])
    }

    fn now() -> Timestamp {
        Timestamp::new(1_000)
    }

    #[test]
    fn test_valid_names() {
        for name in ["abc", "Alice_01", "_x_", "a2345678901234567890", "0_x"] {
            assert!(validate_username(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in [
            "ab",
            "a23456789012345678901",
            "has space",
            "dash-ed",
            "émile",
            "0xabc",
            "0Xabc",
            "",
        ] {
            assert!(validate_username(name).is_err(), "{name:?} should be invalid");
        }
    }

    #[test]
    fn test_register_binds_both_directions() {
        let mut dir = UsernameDirectory::new(0);
        let record = dir.register_username(&addr(1), "alice", 0, now()).unwrap();
        assert_eq!(record.owner, addr(1));
        assert_eq!(dir.resolve_username("alice"), Some(addr(1)));
        assert_eq!(dir.get_user_username(&addr(1)), Some("alice"));
        assert!(!dir.is_username_available("alice"));
        assert_eq!(dir.registered_count(), 1);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut dir = UsernameDirectory::new(0);
        dir.register_username(&addr(1), "alice", 0, now()).unwrap();
        assert!(dir.is_username_available("Alice"));
        dir.register_username(&addr(2), "Alice", 0, now()).unwrap();
        assert_eq!(dir.resolve_username("Alice"), Some(addr(2)));
    }

    #[test]
    fn test_taken_name_and_second_name_rejected() {
        let mut dir = UsernameDirectory::new(0);
        dir.register_username(&addr(1), "alice", 0, now()).unwrap();

        let err = dir.register_username(&addr(2), "alice", 0, now()).unwrap_err();
        assert_eq!(err, EconomyError::from(StateError::UsernameTaken("alice".into())));

        let err = dir.register_username(&addr(1), "alice2", 0, now()).unwrap_err();
        assert_eq!(
            err,
            EconomyError::from(StateError::AlreadyHasUsername("alice".into()))
        );
        assert_eq!(dir.resolve_username("alice2"), None);
    }

    #[test]
    fn test_invalid_name_is_unavailable_and_rejected() {
        let mut dir = UsernameDirectory::new(0);
        assert!(!dir.is_username_available("0xdead"));
        let err = dir.register_username(&addr(1), "0xdead", 0, now()).unwrap_err();
        assert!(matches!(
            err,
            EconomyError::Validation(ValidationError::InvalidUsername { .. })
        ));
        assert_eq!(dir.registered_count(), 0);
    }

    #[test]
    fn test_fee_underpayment_rejected_overpayment_kept() {
        let mut dir = UsernameDirectory::new(100);
        let err = dir.register_username(&addr(1), "alice", 99, now()).unwrap_err();
        assert_eq!(
            err,
            EconomyError::from(ValidationError::InsufficientFee {
                paid: 99,
                required: 100
            })
        );
        assert_eq!(dir.collected_fees(), 0);

        dir.register_username(&addr(1), "alice", 150, now()).unwrap();
        assert_eq!(dir.collected_fees(), 150);
    }

    #[test]
    fn test_withdraw_fees_sweeps_everything() {
        let mut dir = UsernameDirectory::new(10);
        dir.register_username(&addr(1), "alice", 10, now()).unwrap();
        dir.register_username(&addr(2), "bob", 10, now()).unwrap();
        assert_eq!(dir.withdraw_fees(), 20);
        assert_eq!(dir.collected_fees(), 0);
        assert_eq!(dir.withdraw_fees(), 0);
    }

    #[test]
    fn test_fee_change_applies_to_next_registration() {
        let mut dir = UsernameDirectory::new(0);
        assert_eq!(dir.set_registration_fee(50), 0);
        assert_eq!(dir.registration_fee(), 50);
        assert!(dir.register_username(&addr(1), "alice", 0, now()).is_err());
        assert!(dir.register_username(&addr(1), "alice", 50, now()).is_ok());
    }

    #[test]
    fn test_zero_address_cannot_register() {
        let mut dir = UsernameDirectory::new(0);
        let err = dir
            .register_username(&PlayerAddress::ZERO, "nobody", 0, now())
            .unwrap_err();
        assert_eq!(err, EconomyError::from(ValidationError::ZeroAddress));
    }
}
