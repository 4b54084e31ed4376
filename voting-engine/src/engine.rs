//! Voting workflow engine

use crate::config::EngineConfig;
use crate::event::{EventLog, VotingEvent};
use crate::guard::ReentrancyGuard;
use crate::proposal::{Proposal, ProposalRegistry};
use crate::status::WorkflowStatus;
use crate::voter::{Voter, VoterRegistry};
use crate::{VotingError, VotingResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use voting_core::{Address, ProposalId};

/// Authority-gated voting state machine.
///
/// All mutation goes through the operations below. Every failing operation
/// leaves the state untouched; only `register_voters` skips bad elements
/// instead of failing.
#[derive(Debug)]
pub struct VotingEngine {
    /// Administrator identity
    pub(crate) authority: Address,
    /// Current lifecycle stage
    pub(crate) status: WorkflowStatus,
    /// Voter allow-list
    pub(crate) voters: VoterRegistry,
    /// Current round's proposals
    pub(crate) proposals: ProposalRegistry,
    /// Set by the tally, cleared by reset
    pub(crate) winning_proposal_id: Option<ProposalId>,
    /// Notifications
    events: EventLog,
    /// Guards `cast_vote`
    vote_guard: Arc<ReentrancyGuard>,
}

impl VotingEngine {
    /// Create an engine administered by `authority`
    pub fn new(authority: Address) -> Self {
        Self {
            authority,
            status: WorkflowStatus::RegisteringVoters,
            voters: VoterRegistry::new(),
            proposals: ProposalRegistry::new(),
            winning_proposal_id: None,
            events: EventLog::new(),
            vote_guard: Arc::new(ReentrancyGuard::new()),
        }
    }

    /// Create an engine from configuration, pre-registering its voters
    pub fn from_config(config: &EngineConfig) -> VotingResult<Self> {
        config.validate()?;

        let mut engine = Self::new(config.authority);
        let initial = config.initial_voter.into_iter().filter(|v| !v.is_zero());
        let admitted = engine.admit(initial.chain(config.initial_voters.iter().copied()));

        info!(
            "Voting engine created, authority {}, {} voter(s) pre-registered",
            engine.authority, admitted
        );
        Ok(engine)
    }

    // ----- access control -----

    /// Current authority
    pub fn owner(&self) -> Address {
        self.authority
    }

    /// Hand the authority over to `new_owner`
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> VotingResult<()> {
        self.require_authority(caller)?;
        if new_owner.is_zero() {
            return Err(VotingError::InvalidIdentity);
        }

        let previous = std::mem::replace(&mut self.authority, new_owner);
        info!("Ownership transferred from {} to {}", previous, new_owner);
        self.events.emit(VotingEvent::OwnershipTransferred {
            previous,
            new: new_owner,
        });
        Ok(())
    }

    fn require_authority(&self, caller: &Address) -> VotingResult<()> {
        if *caller != self.authority {
            return Err(VotingError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    fn require_voter(&self, caller: &Address) -> VotingResult<()> {
        if !self.voters.is_registered(caller) {
            return Err(VotingError::NotAVoter { caller: *caller });
        }
        Ok(())
    }

    fn require_status(&self, expected: WorkflowStatus) -> VotingResult<()> {
        if self.status != expected {
            return Err(VotingError::InvalidWorkflowStatus {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    // ----- voter registry -----

    /// Register one voter
    pub fn register_voter(&mut self, caller: &Address, voter: Address) -> VotingResult<()> {
        self.require_authority(caller)?;
        if self.status != WorkflowStatus::RegisteringVoters {
            return Err(VotingError::RegistrationNotOpen);
        }

        self.voters.register(voter)?;
        debug!("Voter registered: {}", voter);
        self.events.emit(VotingEvent::VoterRegistered { voter });
        Ok(())
    }

    /// Register many voters in one call.
    ///
    /// Null and already-registered identities are skipped. Returns how many
    /// voters were added.
    pub fn register_voters(
        &mut self,
        caller: &Address,
        voters: &[Address],
    ) -> VotingResult<usize> {
        self.require_authority(caller)?;
        if self.status != WorkflowStatus::RegisteringVoters {
            return Err(VotingError::RegistrationNotOpen);
        }

        let admitted = self.admit(voters.iter().copied());
        debug!(
            "Batch registration: {} of {} voter(s) added",
            admitted,
            voters.len()
        );
        Ok(admitted)
    }

    fn admit<I>(&mut self, voters: I) -> usize
    where
        I: IntoIterator<Item = Address>,
    {
        let registered = self.voters.register_many(voters);
        for voter in &registered {
            self.events.emit(VotingEvent::VoterRegistered { voter: *voter });
        }
        registered.len()
    }

    /// Voter record for `voter`; unregistered identities read as an empty record
    pub fn get_voter(&self, caller: &Address, voter: &Address) -> VotingResult<Voter> {
        self.require_voter(caller)?;
        Ok(self.voters.get(voter).cloned().unwrap_or_default())
    }

    /// Number of registered voters
    pub fn voters_count(&self) -> u64 {
        self.voters.voters_count()
    }

    // ----- proposal registry -----

    /// Open proposal registration, seeding the GENESIS sentinel
    pub fn start_proposals_registering(&mut self, caller: &Address) -> VotingResult<()> {
        self.require_authority(caller)?;
        self.require_status(WorkflowStatus::RegisteringVoters)?;

        self.proposals.open();
        self.set_status(WorkflowStatus::ProposalsRegistrationStarted);
        Ok(())
    }

    /// Submit a proposal, returning its index
    pub fn add_proposal(
        &mut self,
        caller: &Address,
        description: &str,
    ) -> VotingResult<ProposalId> {
        self.require_voter(caller)?;
        if self.status != WorkflowStatus::ProposalsRegistrationStarted {
            return Err(VotingError::RegistrationNotStarted);
        }

        let proposal_id = self.proposals.add(description)?;
        debug!("Proposal {} registered by {}", proposal_id, caller);
        self.events.emit(VotingEvent::ProposalRegistered { proposal_id });
        Ok(proposal_id)
    }

    /// Get one proposal
    pub fn get_one_proposal(
        &self,
        caller: &Address,
        proposal_id: ProposalId,
    ) -> VotingResult<Proposal> {
        self.require_voter(caller)?;
        self.proposals.get(proposal_id).cloned()
    }

    /// Get every proposal of the current round
    pub fn get_all_proposals(&self, caller: &Address) -> VotingResult<Vec<Proposal>> {
        self.require_voter(caller)?;
        Ok(self.proposals.all().to_vec())
    }

    /// Number of proposals in the current round, GENESIS included
    pub fn get_proposals_count(&self, caller: &Address) -> VotingResult<usize> {
        self.require_voter(caller)?;
        Ok(self.proposals.len())
    }

    // ----- workflow -----

    /// Current lifecycle stage
    pub fn workflow_status(&self) -> WorkflowStatus {
        self.status
    }

    /// Close proposal registration
    pub fn end_proposals_registering(&mut self, caller: &Address) -> VotingResult<()> {
        self.step(caller, WorkflowStatus::ProposalsRegistrationStarted)
    }

    /// Open the voting session
    pub fn start_voting_session(&mut self, caller: &Address) -> VotingResult<()> {
        self.step(caller, WorkflowStatus::ProposalsRegistrationEnded)
    }

    /// Close the voting session
    pub fn end_voting_session(&mut self, caller: &Address) -> VotingResult<()> {
        self.step(caller, WorkflowStatus::VotingSessionStarted)
    }

    /// Authority-only single step forward from `from`
    fn step(&mut self, caller: &Address, from: WorkflowStatus) -> VotingResult<()> {
        self.require_authority(caller)?;
        self.require_status(from)?;

        let to = from.next().ok_or(VotingError::InvalidWorkflowStatus {
            expected: from,
            actual: self.status,
        })?;
        self.set_status(to);
        Ok(())
    }

    fn set_status(&mut self, new: WorkflowStatus) {
        let previous = self.status;
        debug_assert!(previous.can_transition_to(new));

        self.status = new;
        info!("Workflow status change: {} -> {}", previous, new);
        self.events.emit(VotingEvent::WorkflowStatusChange { previous, new });
    }

    // ----- voting and tally -----

    /// Cast the caller's single vote for `proposal_id`
    pub fn cast_vote(&mut self, caller: &Address, proposal_id: ProposalId) -> VotingResult<()> {
        let vote_guard = Arc::clone(&self.vote_guard);
        let _in_progress = vote_guard.enter()?;

        self.require_voter(caller)?;
        if self.status != WorkflowStatus::VotingSessionStarted {
            return Err(VotingError::VotingSessionNotStarted);
        }
        if self.voters.get(caller).is_some_and(|v| v.has_voted) {
            return Err(VotingError::AlreadyVoted(*caller));
        }
        if !self.proposals.contains(proposal_id) {
            return Err(VotingError::ProposalNotFound {
                id: proposal_id,
                count: self.proposals.len(),
            });
        }

        self.voters.record_vote(caller, proposal_id)?;
        self.proposals.add_vote(proposal_id)?;
        debug!("{} voted for proposal {}", caller, proposal_id);
        self.events.emit(VotingEvent::Voted {
            voter: *caller,
            proposal_id,
        });
        Ok(())
    }

    /// Compute the winner and close the round
    pub fn tally_votes(&mut self, caller: &Address) -> VotingResult<ProposalId> {
        self.require_authority(caller)?;
        if self.status != WorkflowStatus::VotingSessionEnded {
            return Err(VotingError::VotingSessionNotEnded);
        }

        let winner = self.proposals.tally().ok_or(VotingError::ProposalNotFound {
            id: 0,
            count: 0,
        })?;
        self.winning_proposal_id = Some(winner);
        info!("Votes tallied, winning proposal {}", winner);
        self.set_status(WorkflowStatus::VotesTallied);
        Ok(winner)
    }

    /// Index of the winning proposal, available once votes are tallied
    pub fn winning_proposal_id(&self) -> VotingResult<ProposalId> {
        self.require_status(WorkflowStatus::VotesTallied)?;
        self.winning_proposal_id
            .ok_or(VotingError::InvalidWorkflowStatus {
                expected: WorkflowStatus::VotesTallied,
                actual: self.status,
            })
    }

    /// The winning proposal, available once votes are tallied
    pub fn get_winner(&self) -> VotingResult<Proposal> {
        let winner = self.winning_proposal_id()?;
        self.proposals.get(winner).cloned()
    }

    /// Start a new round with the same electorate.
    ///
    /// Drops the proposals and the winner and clears every voter's vote;
    /// registrations and `voters_count` are kept.
    pub fn reset_voting(&mut self, caller: &Address) -> VotingResult<()> {
        self.require_authority(caller)?;
        self.require_status(WorkflowStatus::VotesTallied)?;

        self.proposals.clear();
        self.winning_proposal_id = None;
        self.voters.clear_votes();
        info!("Voting reset, {} voter(s) kept", self.voters.voters_count());
        self.set_status(WorkflowStatus::RegisteringVoters);
        Ok(())
    }

    // ----- notifications -----

    /// Attach a live notification subscriber
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<VotingEvent> {
        self.events.subscribe()
    }

    /// Drain notifications emitted since the last call
    pub fn take_events(&mut self) -> Vec<VotingEvent> {
        self.events.drain()
    }

    /// Notifications not yet drained
    pub fn pending_events(&self) -> &[VotingEvent] {
        self.events.pending()
    }

    /// Drain the notifications emitted after the first `mark` pending ones
    pub(crate) fn take_events_from(&mut self, mark: usize) -> Vec<VotingEvent> {
        self.events.drain_from(mark)
    }
}
