//! Engine snapshots and shared handle

use crate::engine::VotingEngine;
use crate::executor::{Call, CallExecutor, ExecutionResult};
use crate::proposal::ProposalRegistry;
use crate::status::WorkflowStatus;
use crate::voter::VoterRegistry;
use crate::{VotingError, VotingResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use voting_core::{Address, ProposalId};

/// Complete engine state, without notifications or in-flight guards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub authority: Address,
    pub status: WorkflowStatus,
    pub voters: VoterRegistry,
    pub proposals: ProposalRegistry,
    pub winning_proposal_id: Option<ProposalId>,
}

impl EngineSnapshot {
    /// Binary encoding
    pub fn encode(&self) -> VotingResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from the binary encoding
    pub fn decode(bytes: &[u8]) -> VotingResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Digest of the binary encoding
    pub fn state_root(&self) -> VotingResult<[u8; 32]> {
        Ok(*blake3::hash(&self.encode()?).as_bytes())
    }

    /// Check the structural invariants a live engine upholds
    pub fn validate(&self) -> VotingResult<()> {
        if self.authority.is_zero() {
            return Err(VotingError::Serialization(
                "Snapshot authority is the zero address".to_string(),
            ));
        }

        let registered = self.voters.iter().filter(|(_, v)| v.is_registered).count() as u64;
        if registered != self.voters.voters_count() {
            return Err(VotingError::Serialization(format!(
                "Snapshot voters_count {} does not match {} registered voter(s)",
                self.voters.voters_count(),
                registered
            )));
        }

        let proposals_open = self.status >= WorkflowStatus::ProposalsRegistrationStarted;
        let genesis_ok = self.proposals.has_genesis();
        if proposals_open != genesis_ok || (!proposals_open && !self.proposals.is_empty()) {
            return Err(VotingError::Serialization(format!(
                "Snapshot proposals inconsistent with status {}",
                self.status
            )));
        }

        // ballots must add up to the per-proposal counts
        let session_opened = self.status >= WorkflowStatus::VotingSessionStarted;
        let mut ballots: u64 = 0;
        for (address, voter) in self.voters.iter() {
            if let Some(proposal_id) = voter.vote() {
                if !voter.is_registered
                    || !session_opened
                    || !self.proposals.contains(proposal_id)
                {
                    return Err(VotingError::Serialization(format!(
                        "Snapshot vote of {} for proposal {} inconsistent with status {}",
                        address, proposal_id, self.status
                    )));
                }
                ballots += 1;
            }
        }
        let counted: u64 = self.proposals.all().iter().map(|p| p.vote_count).sum();
        if counted != ballots {
            return Err(VotingError::Serialization(format!(
                "Snapshot holds {} vote(s) but {} ballot(s)",
                counted, ballots
            )));
        }

        let tallied = self.status == WorkflowStatus::VotesTallied;
        match self.winning_proposal_id {
            Some(id) if tallied && self.proposals.contains(id) => {}
            None if !tallied => {}
            _ => {
                return Err(VotingError::Serialization(format!(
                    "Snapshot winner inconsistent with status {}",
                    self.status
                )))
            }
        }

        Ok(())
    }
}

impl VotingEngine {
    /// Capture the complete state
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            authority: self.authority,
            status: self.status,
            voters: self.voters.clone(),
            proposals: self.proposals.clone(),
            winning_proposal_id: self.winning_proposal_id,
        }
    }

    /// Replace the state with a validated snapshot
    pub fn restore(&mut self, snapshot: EngineSnapshot) -> VotingResult<()> {
        snapshot.validate()?;

        self.authority = snapshot.authority;
        self.status = snapshot.status;
        self.voters = snapshot.voters;
        self.proposals = snapshot.proposals;
        self.winning_proposal_id = snapshot.winning_proposal_id;
        Ok(())
    }

    /// Build an engine from a validated snapshot
    pub fn from_snapshot(snapshot: EngineSnapshot) -> VotingResult<Self> {
        let mut engine = VotingEngine::new(snapshot.authority);
        engine.restore(snapshot)?;
        Ok(engine)
    }

    /// Digest of the complete state
    pub fn state_root(&self) -> VotingResult<[u8; 32]> {
        self.snapshot().state_root()
    }
}

/// Thread-safe engine handle.
///
/// Mutations take the write lock, so calls are applied one at a time;
/// queries share the read lock.
pub struct SharedVotingEngine {
    inner: Arc<RwLock<VotingEngine>>,
}

impl SharedVotingEngine {
    /// Wrap an engine
    pub fn new(engine: VotingEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Run a query against the current state
    pub fn read<R>(&self, f: impl FnOnce(&VotingEngine) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run a mutation with exclusive access
    pub fn write<R>(&self, f: impl FnOnce(&mut VotingEngine) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Execute one call on behalf of `caller`; queries only take the read lock
    pub fn execute(&self, caller: &Address, call: Call) -> ExecutionResult {
        if !call.is_mutation() {
            if let Some(result) = CallExecutor::query(&self.inner.read(), caller, &call) {
                return result;
            }
        }
        CallExecutor::execute(&mut self.inner.write(), caller, call)
    }

    /// Current lifecycle stage
    pub fn workflow_status(&self) -> WorkflowStatus {
        self.inner.read().workflow_status()
    }

    /// Capture the complete state
    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.read().snapshot()
    }

    /// Digest of the complete state
    pub fn state_root(&self) -> VotingResult<[u8; 32]> {
        self.inner.read().state_root()
    }
}

impl Clone for SharedVotingEngine {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn tallied_engine() -> VotingEngine {
        let owner = addr(0xaa);
        let mut engine = VotingEngine::new(owner);
        engine.register_voters(&owner, &[addr(1), addr(2)]).unwrap();
        engine.start_proposals_registering(&owner).unwrap();
        engine.add_proposal(&addr(1), "Proposal 1").unwrap();
        engine.end_proposals_registering(&owner).unwrap();
        engine.start_voting_session(&owner).unwrap();
        engine.cast_vote(&addr(1), 1).unwrap();
        engine.end_voting_session(&owner).unwrap();
        engine.tally_votes(&owner).unwrap();
        engine
    }

    #[test]
    fn test_snapshot_restore() {
        let engine = tallied_engine();
        let snapshot = engine.snapshot();

        let decoded = EngineSnapshot::decode(&snapshot.encode().unwrap()).unwrap();
        assert_eq!(decoded, snapshot);

        let restored = VotingEngine::from_snapshot(decoded).unwrap();
        assert_eq!(restored.workflow_status(), WorkflowStatus::VotesTallied);
        assert_eq!(restored.winning_proposal_id().unwrap(), 1);
        assert_eq!(restored.state_root().unwrap(), engine.state_root().unwrap());
    }

    #[test]
    fn test_state_root_unchanged_by_failed_call() {
        let mut engine = tallied_engine();
        let root = engine.state_root().unwrap();

        assert!(engine.cast_vote(&addr(2), 1).is_err());
        assert!(engine.add_proposal(&addr(1), "Late").is_err());
        assert!(engine.reset_voting(&addr(1)).is_err());
        assert_eq!(engine.state_root().unwrap(), root);

        engine.reset_voting(&addr(0xaa)).unwrap();
        assert_ne!(engine.state_root().unwrap(), root);
    }

    #[test]
    fn test_restore_rejects_inconsistent_snapshot() {
        let mut engine = tallied_engine();

        let mut snapshot = engine.snapshot();
        snapshot.winning_proposal_id = None;
        assert!(engine.restore(snapshot).is_err());

        let mut snapshot = engine.snapshot();
        snapshot.status = WorkflowStatus::RegisteringVoters;
        snapshot.winning_proposal_id = None;
        assert!(engine.restore(snapshot).is_err());

        let mut snapshot = engine.snapshot();
        snapshot.authority = Address::zero();
        assert!(engine.restore(snapshot).is_err());

        assert_eq!(engine.workflow_status(), WorkflowStatus::VotesTallied);
    }

    /// Round-trip a snapshot through JSON with `edit` applied to the value
    fn edited(
        snapshot: &EngineSnapshot,
        edit: impl FnOnce(&mut serde_json::Value),
    ) -> EngineSnapshot {
        let mut value = serde_json::to_value(snapshot).unwrap();
        edit(&mut value);
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_restore_rejects_inconsistent_voters() {
        let owner = addr(0xaa);
        let mut engine = VotingEngine::new(owner);
        engine.register_voters(&owner, &[addr(1), addr(2)]).unwrap();
        let voter1 = addr(1).to_string();
        let snapshot = engine.snapshot();

        let miscounted = edited(&snapshot, |v| v["voters"]["voters_count"] = 7.into());
        assert!(matches!(
            engine.restore(miscounted),
            Err(VotingError::Serialization(_))
        ));

        // a ballot before the session opened, for a proposal that does not exist
        let early_vote = edited(&snapshot, |v| {
            v["voters"]["voters"][&voter1]["has_voted"] = true.into();
            v["voters"]["voters"][&voter1]["voted_proposal_id"] = 99.into();
        });
        assert!(engine.restore(early_vote).is_err());

        assert_eq!(engine.voters_count(), 2);
        assert_eq!(engine.get_voter(&addr(1), &addr(1)).unwrap().vote(), None);
    }

    #[test]
    fn test_restore_rejects_inconsistent_ballots() {
        let mut engine = tallied_engine();
        let voter2 = addr(2).to_string();
        let snapshot = engine.snapshot();

        let out_of_bounds = edited(&snapshot, |v| {
            v["voters"]["voters"][&voter2]["has_voted"] = true.into();
            v["voters"]["voters"][&voter2]["voted_proposal_id"] = 99.into();
        });
        assert!(engine.restore(out_of_bounds).is_err());

        // ballot recorded without the matching proposal count
        let uncounted = edited(&snapshot, |v| {
            v["voters"]["voters"][&voter2]["has_voted"] = true.into();
            v["voters"]["voters"][&voter2]["voted_proposal_id"] = 1.into();
        });
        assert!(engine.restore(uncounted).is_err());

        let inflated = edited(&snapshot, |v| {
            v["proposals"]["proposals"][1]["vote_count"] = 5.into();
        });
        assert!(engine.restore(inflated).is_err());

        // GENESIS keeps its identity once it holds votes
        let mut genesis_vote = edited(&snapshot, |v| {
            v["voters"]["voters"][&voter2]["has_voted"] = true.into();
            v["voters"]["voters"][&voter2]["voted_proposal_id"] = 0.into();
            v["proposals"]["proposals"][0]["vote_count"] = 1.into();
        });
        genesis_vote.winning_proposal_id = Some(0);
        engine.restore(genesis_vote).unwrap();
        assert_eq!(engine.winning_proposal_id().unwrap(), 0);
        assert_eq!(engine.get_winner().unwrap().vote_count, 1);
    }

    #[test]
    fn test_shared_engine_queries_share_the_read_lock() {
        let owner = addr(0xaa);
        let shared = SharedVotingEngine::new(VotingEngine::new(owner));
        shared.execute(&owner, Call::RegisterVoter { voter: addr(1) });

        let guard = shared.inner.read();
        let result = shared.execute(&addr(1), Call::GetVoter { voter: addr(1) });
        drop(guard);

        assert!(result.success);
        assert!(matches!(result.output, crate::CallOutput::Voter(ref v) if v.is_registered));
    }

    #[test]
    fn test_shared_engine_serializes_writers() {
        let owner = addr(0xaa);
        let shared = SharedVotingEngine::new(VotingEngine::new(owner));

        let handles: Vec<_> = (1u8..=8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared.execute(&owner, Call::RegisterVoter { voter: addr(i) })
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().success);
        }
        assert_eq!(shared.read(|engine| engine.voters_count()), 8);
        assert_eq!(shared.workflow_status(), WorkflowStatus::RegisteringVoters);
        assert_eq!(
            shared.state_root().unwrap(),
            shared.snapshot().state_root().unwrap()
        );
    }
}
