//! Voter model and registry

use crate::{VotingError, VotingResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use voting_core::{Address, ProposalId};

/// Voter record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    /// Whether the identity is on the allow-list
    pub is_registered: bool,
    /// Whether the voter has voted in the current round
    pub has_voted: bool,
    /// Chosen proposal; only meaningful while `has_voted` is true
    pub voted_proposal_id: ProposalId,
}

impl Voter {
    /// Create a freshly registered voter
    pub fn registered() -> Self {
        Self {
            is_registered: true,
            has_voted: false,
            voted_proposal_id: 0,
        }
    }

    /// The voted proposal, if the voter has voted
    pub fn vote(&self) -> Option<ProposalId> {
        self.has_voted.then_some(self.voted_proposal_id)
    }

    /// Record a vote
    pub fn record_vote(&mut self, proposal_id: ProposalId) {
        self.has_voted = true;
        self.voted_proposal_id = proposal_id;
    }

    /// Forget the vote of a finished round
    pub fn clear_vote(&mut self) {
        self.has_voted = false;
        self.voted_proposal_id = 0;
    }
}

/// Allow-list of voters, keyed by identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRegistry {
    /// Registered voters, ordered for deterministic encoding
    voters: BTreeMap<Address, Voter>,
    /// Number of registered identities
    voters_count: u64,
}

impl VoterRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single identity
    pub fn register(&mut self, voter: Address) -> VotingResult<()> {
        if voter.is_zero() {
            return Err(VotingError::InvalidIdentity);
        }
        if self.is_registered(&voter) {
            return Err(VotingError::AlreadyRegistered(voter));
        }

        self.voters.insert(voter, Voter::registered());
        self.voters_count += 1;
        Ok(())
    }

    /// Register every valid new identity, skipping null and duplicate ones.
    /// Returns the identities actually registered, in input order.
    pub fn register_many<I>(&mut self, voters: I) -> Vec<Address>
    where
        I: IntoIterator<Item = Address>,
    {
        voters
            .into_iter()
            .filter(|voter| self.register(*voter).is_ok())
            .collect()
    }

    /// Get voter record
    pub fn get(&self, voter: &Address) -> Option<&Voter> {
        self.voters.get(voter)
    }

    /// Check if identity is on the allow-list
    pub fn is_registered(&self, voter: &Address) -> bool {
        self.voters.get(voter).is_some_and(|v| v.is_registered)
    }

    /// Record a vote for a registered voter who has not voted yet
    pub fn record_vote(&mut self, voter: &Address, proposal_id: ProposalId) -> VotingResult<()> {
        let record = self
            .voters
            .get_mut(voter)
            .ok_or(VotingError::NotAVoter { caller: *voter })?;
        if record.has_voted {
            return Err(VotingError::AlreadyVoted(*voter));
        }
        record.record_vote(proposal_id);
        Ok(())
    }

    /// Clear every voter's vote, keeping registrations
    pub fn clear_votes(&mut self) {
        for voter in self.voters.values_mut() {
            voter.clear_vote();
        }
    }

    /// Number of registered identities
    pub fn voters_count(&self) -> u64 {
        self.voters_count
    }

    /// Iterate over registered voters in address order
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Voter)> {
        self.voters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn test_voter_creation() {
        let voter = Voter::registered();
        assert!(voter.is_registered);
        assert!(!voter.has_voted);
        assert_eq!(voter.vote(), None);
    }

    #[test]
    fn test_vote_recording() {
        let mut voter = Voter::registered();
        voter.record_vote(3);
        assert_eq!(voter.vote(), Some(3));

        voter.clear_vote();
        assert!(!voter.has_voted);
        assert_eq!(voter.vote(), None);
        assert!(voter.is_registered);
    }

    #[test]
    fn test_register() {
        let mut registry = VoterRegistry::new();
        registry.register(addr(1)).unwrap();

        assert!(registry.is_registered(&addr(1)));
        assert!(!registry.is_registered(&addr(2)));
        assert_eq!(registry.voters_count(), 1);

        assert_eq!(
            registry.register(addr(1)),
            Err(VotingError::AlreadyRegistered(addr(1)))
        );
        assert_eq!(registry.register(Address::zero()), Err(VotingError::InvalidIdentity));
        assert_eq!(registry.voters_count(), 1);
    }

    #[test]
    fn test_register_many_skips_invalid() {
        let mut registry = VoterRegistry::new();
        let registered = registry.register_many([addr(1), Address::zero(), addr(1), addr(2)]);

        assert_eq!(registered, vec![addr(1), addr(2)]);
        assert_eq!(registry.voters_count(), 2);
        assert!(!registry.is_registered(&Address::zero()));
    }

    #[test]
    fn test_single_vote_per_round() {
        let mut registry = VoterRegistry::new();
        registry.register(addr(1)).unwrap();

        registry.record_vote(&addr(1), 2).unwrap();
        assert_eq!(
            registry.record_vote(&addr(1), 1),
            Err(VotingError::AlreadyVoted(addr(1)))
        );
        assert_eq!(registry.get(&addr(1)).unwrap().vote(), Some(2));

        assert_eq!(
            registry.record_vote(&addr(9), 1),
            Err(VotingError::NotAVoter { caller: addr(9) })
        );

        registry.clear_votes();
        assert_eq!(registry.get(&addr(1)).unwrap().vote(), None);
        assert_eq!(registry.voters_count(), 1);
    }
}
