//! Proposal model and registry

use crate::{VotingError, VotingResult};
use serde::{Deserialize, Serialize};
use voting_core::{ProposalId, VoteCount};

/// Description of the sentinel proposal at index 0
pub const GENESIS_DESCRIPTION: &str = "GENESIS";

/// Proposal record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposal text
    pub description: String,
    /// Votes received in the current round
    pub vote_count: VoteCount,
}

impl Proposal {
    /// Create a proposal with no votes
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            vote_count: 0,
        }
    }

    /// The index-0 sentinel
    pub fn genesis() -> Self {
        Self::new(GENESIS_DESCRIPTION)
    }
}

/// Append-only proposal sequence for one voting round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRegistry {
    proposals: Vec<Proposal>,
}

impl ProposalRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new round's sequence with the GENESIS sentinel
    pub fn open(&mut self) {
        self.proposals.clear();
        self.proposals.push(Proposal::genesis());
    }

    /// Append a proposal, returning its index
    pub fn add(&mut self, description: &str) -> VotingResult<ProposalId> {
        if description.is_empty() {
            return Err(VotingError::EmptyProposal);
        }

        let id = self.proposals.len() as ProposalId;
        self.proposals.push(Proposal::new(description));
        Ok(id)
    }

    /// Get proposal by index
    pub fn get(&self, id: ProposalId) -> VotingResult<&Proposal> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.proposals.get(index))
            .ok_or(VotingError::ProposalNotFound {
                id,
                count: self.proposals.len(),
            })
    }

    /// Whether index 0 holds the GENESIS sentinel, whatever its vote count
    pub fn has_genesis(&self) -> bool {
        self.proposals
            .first()
            .is_some_and(|p| p.description == GENESIS_DESCRIPTION)
    }

    /// Bounds check without borrowing the proposal
    pub fn contains(&self, id: ProposalId) -> bool {
        self.get(id).is_ok()
    }

    /// Add one vote to a proposal
    pub fn add_vote(&mut self, id: ProposalId) -> VotingResult<()> {
        let count = self.proposals.len();
        let proposal = usize::try_from(id)
            .ok()
            .and_then(|index| self.proposals.get_mut(index))
            .ok_or(VotingError::ProposalNotFound { id, count })?;
        proposal.vote_count += 1;
        Ok(())
    }

    /// Index of the winning proposal.
    ///
    /// Single pass keeping the first index that reaches the highest count, so
    /// ties go to the lowest index and an all-zero round elects GENESIS.
    /// `None` only when the sequence is empty.
    pub fn tally(&self) -> Option<ProposalId> {
        let mut winner: Option<(usize, VoteCount)> = None;
        for (index, proposal) in self.proposals.iter().enumerate() {
            match winner {
                Some((_, best)) if proposal.vote_count <= best => {}
                _ => winner = Some((index, proposal.vote_count)),
            }
        }
        winner.map(|(index, _)| index as ProposalId)
    }

    /// All proposals in index order
    pub fn all(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Number of proposals, GENESIS included
    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    /// Check if no round is open
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Drop every proposal, GENESIS included
    pub fn clear(&mut self) {
        self.proposals.clear();
    }
}
