//! Referral graph: referee → referrer, set once per referee.

use std::collections::{BTreeSet, HashMap};

use stakevault_store::{ReferralStore, StoreError, WriteBatch};
use stakevault_types::{
    EconomyError, PlayerAddress, ReferralEdge, StateError, Timestamp, ValidationError,
};

use crate::username::UsernameDirectory;

/// Manages referral links, including a reverse index from referrer to referees.
#[derive(Debug, Default)]
pub struct ReferralGraph {
    /// referee → edge.
    edges: HashMap<PlayerAddress, ReferralEdge>,
    /// Reverse index: referrer → direct referees.
    referees: HashMap<PlayerAddress, BTreeSet<PlayerAddress>>,
}

impl ReferralGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `caller` to `referrer`. Permanent.
    pub fn set_referrer(
        &mut self,
        caller: &PlayerAddress,
        referrer: &PlayerAddress,
        now: Timestamp,
    ) -> Result<ReferralEdge, EconomyError> {
        if caller.is_zero() || referrer.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }
        if caller == referrer {
            return Err(ValidationError::SelfReferral.into());
        }
        if self.edges.contains_key(caller) {
            return Err(StateError::ReferrerAlreadySet.into());
        }

        let edge = ReferralEdge {
            referee: *caller,
            referrer: *referrer,
            created_at: now,
        };
        self.insert(edge);

        tracing::info!(referee = %caller, referrer = %referrer, "referrer set");
        Ok(edge)
    }

    /// Resolve `name` through the directory, then link as [`Self::set_referrer`].
    pub fn set_referrer_by_username(
        &mut self,
        caller: &PlayerAddress,
        name: &str,
        directory: &UsernameDirectory,
        now: Timestamp,
    ) -> Result<ReferralEdge, EconomyError> {
        let referrer = directory
            .resolve_username(name)
            .ok_or_else(|| ValidationError::UnknownUsername(name.to_string()))?;
        self.set_referrer(caller, &referrer, now)
    }

    pub fn referrer_of(&self, player: &PlayerAddress) -> Option<PlayerAddress> {
        self.edges.get(player).map(|e| e.referrer)
    }

    pub fn edge_of(&self, player: &PlayerAddress) -> Option<&ReferralEdge> {
        self.edges.get(player)
    }

    pub fn referee_count(&self, referrer: &PlayerAddress) -> usize {
        self.referees.get(referrer).map_or(0, BTreeSet::len)
    }

    /// Direct referees, in address order.
    pub fn referees_of(&self, referrer: &PlayerAddress) -> Vec<PlayerAddress> {
        self.referees
            .get(referrer)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn stage(&self, referee: &PlayerAddress, batch: &mut WriteBatch) {
        if let Some(edge) = self.edges.get(referee) {
            batch.put_referral(*edge);
        }
    }

    pub fn load_from_store<S: ReferralStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        let mut graph = Self::new();
        for edge in store.iter_referrals()? {
            graph.insert(edge);
        }
        Ok(graph)
    }

    fn insert(&mut self, edge: ReferralEdge) {
        self.edges.insert(edge.referee, edge);
        self.referees
            .entry(edge.referrer)
            .or_default()
            .insert(edge.referee);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakevault_nullables::NullStore;
    use stakevault_store::BatchWriter;

    fn addr(n: u8) -> PlayerAddress {
        PlayerAddress::new([n; 20])
    }

    fn now() -> Timestamp {
        Timestamp::new(42)
    }

    #[test]
    fn test_set_referrer_once() {
        let mut graph = ReferralGraph::new();
        let edge = graph.set_referrer(&addr(1), &addr(2), now()).unwrap();
        assert_eq!(edge.referrer, addr(2));
        assert_eq!(graph.referrer_of(&addr(1)), Some(addr(2)));

        let err = graph.set_referrer(&addr(1), &addr(3), now()).unwrap_err();
        assert_eq!(err, EconomyError::State(StateError::ReferrerAlreadySet));
        assert_eq!(graph.referrer_of(&addr(1)), Some(addr(2)));
    }

    #[test]
    fn test_self_and_zero_referral_rejected() {
        let mut graph = ReferralGraph::new();
        assert_eq!(
            graph.set_referrer(&addr(1), &addr(1), now()).unwrap_err(),
            EconomyError::Validation(ValidationError::SelfReferral)
        );
        assert_eq!(
            graph
                .set_referrer(&addr(1), &PlayerAddress::ZERO, now())
                .unwrap_err(),
            EconomyError::Validation(ValidationError::ZeroAddress)
        );
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_reverse_index() {
        let mut graph = ReferralGraph::new();
        graph.set_referrer(&addr(3), &addr(9), now()).unwrap();
        graph.set_referrer(&addr(1), &addr(9), now()).unwrap();
        graph.set_referrer(&addr(9), &addr(5), now()).unwrap();

        assert_eq!(graph.referee_count(&addr(9)), 2);
        assert_eq!(graph.referees_of(&addr(9)), vec![addr(1), addr(3)]);
        assert_eq!(graph.referee_count(&addr(5)), 1);
        assert!(graph.referees_of(&addr(1)).is_empty());
    }

    #[test]
    fn test_by_username_resolves_through_directory() {
        let mut dir = UsernameDirectory::new(0);
        dir.register_username(&addr(2), "alice", 0, now()).unwrap();
        let mut graph = ReferralGraph::new();

        let edge = graph
            .set_referrer_by_username(&addr(1), "alice", &dir, now())
            .unwrap();
        assert_eq!(edge.referrer, addr(2));

        let err = graph
            .set_referrer_by_username(&addr(3), "nobody", &dir, now())
            .unwrap_err();
        assert_eq!(
            err,
            EconomyError::Validation(ValidationError::UnknownUsername("nobody".into()))
        );

        // Registering your own name and then referring to it is still self-referral.
        dir.register_username(&addr(4), "dave", 0, now()).unwrap();
        let err = graph
            .set_referrer_by_username(&addr(4), "dave", &dir, now())
            .unwrap_err();
        assert_eq!(err, EconomyError::Validation(ValidationError::SelfReferral));
    }

    #[test]
    fn test_store_round_trip_rebuilds_reverse_index() {
        let mut graph = ReferralGraph::new();
        graph.set_referrer(&addr(1), &addr(2), now()).unwrap();
        graph.set_referrer(&addr(3), &addr(2), now()).unwrap();

        let store = NullStore::new();
        let mut batch = WriteBatch::new();
        graph.stage(&addr(1), &mut batch);
        graph.stage(&addr(3), &mut batch);
        graph.stage(&addr(2), &mut batch);
        store.write_batch(&batch).unwrap();

        let loaded = ReferralGraph::load_from_store(&store).unwrap();
        assert_eq!(loaded.referees_of(&addr(2)), vec![addr(1), addr(3)]);
        assert_eq!(loaded.referrer_of(&addr(3)), Some(addr(2)));
    }
}
