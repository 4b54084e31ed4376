//! Call dispatch

use crate::engine::VotingEngine;
use crate::event::VotingEvent;
use crate::proposal::Proposal;
use crate::voter::Voter;
use crate::{VotingError, VotingResult};
use serde::{Deserialize, Serialize};
use tracing::debug;
use voting_core::{Address, ProposalId};

/// One engine operation, as a client submits it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    RegisterVoter { voter: Address },
    RegisterVoters { voters: Vec<Address> },
    StartProposalsRegistering,
    AddProposal { description: String },
    EndProposalsRegistering,
    StartVotingSession,
    CastVote { proposal_id: ProposalId },
    EndVotingSession,
    TallyVotes,
    ResetVoting,
    TransferOwnership { new_owner: Address },
    GetVoter { voter: Address },
    GetOneProposal { proposal_id: ProposalId },
    GetAllProposals,
    GetProposalsCount,
    GetWinner,
}

impl Call {
    /// Whether the call can change engine state
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Call::GetVoter { .. }
                | Call::GetOneProposal { .. }
                | Call::GetAllProposals
                | Call::GetProposalsCount
                | Call::GetWinner
        )
    }
}

/// Value returned by a successful call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CallOutput {
    None,
    Registered(usize),
    ProposalId(ProposalId),
    Voter(Voter),
    Proposal(Proposal),
    Proposals(Vec<Proposal>),
    Count(usize),
}

/// Outcome of one call
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Whether the call committed
    pub success: bool,
    /// Returned value
    pub output: CallOutput,
    /// Notifications emitted by the call
    pub events: Vec<VotingEvent>,
    /// Rejection reason if failed
    pub error: Option<VotingError>,
}

impl ExecutionResult {
    /// Create successful result
    pub fn success(output: CallOutput, events: Vec<VotingEvent>) -> Self {
        Self {
            success: true,
            output,
            events,
            error: None,
        }
    }

    /// Create failed result
    pub fn failure(error: VotingError) -> Self {
        Self {
            success: false,
            output: CallOutput::None,
            events: Vec::new(),
            error: Some(error),
        }
    }

    /// Back to a `Result`
    pub fn into_result(self) -> VotingResult<CallOutput> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.output),
        }
    }
}

/// Applies `Call`s to an engine the way a client observes transactions:
/// a rejected call is reported in the result, not propagated.
pub struct CallExecutor;

impl CallExecutor {
    /// Execute a call on behalf of `caller`.
    ///
    /// The result carries only the notifications this call emitted; events
    /// already pending on the engine are left for their owner to drain.
    pub fn execute(engine: &mut VotingEngine, caller: &Address, call: Call) -> ExecutionResult {
        debug!("Executing {:?} from {}", call, caller);

        let mark = engine.pending_events().len();
        let output = Self::apply(engine, caller, call);
        let events = engine.take_events_from(mark);
        Self::finish(caller, output, events)
    }

    /// Answer a read-only call without mutable access.
    ///
    /// Returns `None` for calls that mutate state.
    pub fn query(engine: &VotingEngine, caller: &Address, call: &Call) -> Option<ExecutionResult> {
        let output = Self::read(engine, caller, call)?;
        Some(Self::finish(caller, output, Vec::new()))
    }

    fn finish(
        caller: &Address,
        output: VotingResult<CallOutput>,
        events: Vec<VotingEvent>,
    ) -> ExecutionResult {
        match output {
            Ok(output) => ExecutionResult::success(output, events),
            Err(err) => {
                debug!("Call from {} rejected: {}", caller, err);
                ExecutionResult::failure(err)
            }
        }
    }

    fn read(
        engine: &VotingEngine,
        caller: &Address,
        call: &Call,
    ) -> Option<VotingResult<CallOutput>> {
        let output = match call {
            Call::GetVoter { voter } => engine.get_voter(caller, voter).map(CallOutput::Voter),
            Call::GetOneProposal { proposal_id } => engine
                .get_one_proposal(caller, *proposal_id)
                .map(CallOutput::Proposal),
            Call::GetAllProposals => engine.get_all_proposals(caller).map(CallOutput::Proposals),
            Call::GetProposalsCount => engine.get_proposals_count(caller).map(CallOutput::Count),
            Call::GetWinner => engine.get_winner().map(CallOutput::Proposal),
            _ => return None,
        };
        Some(output)
    }

    fn apply(
        engine: &mut VotingEngine,
        caller: &Address,
        call: Call,
    ) -> VotingResult<CallOutput> {
        let output = match call {
            Call::RegisterVoter { voter } => {
                engine.register_voter(caller, voter)?;
                CallOutput::None
            }
            Call::RegisterVoters { voters } => {
                CallOutput::Registered(engine.register_voters(caller, &voters)?)
            }
            Call::StartProposalsRegistering => {
                engine.start_proposals_registering(caller)?;
                CallOutput::None
            }
            Call::AddProposal { description } => {
                CallOutput::ProposalId(engine.add_proposal(caller, &description)?)
            }
            Call::EndProposalsRegistering => {
                engine.end_proposals_registering(caller)?;
                CallOutput::None
            }
            Call::StartVotingSession => {
                engine.start_voting_session(caller)?;
                CallOutput::None
            }
            Call::CastVote { proposal_id } => {
                engine.cast_vote(caller, proposal_id)?;
                CallOutput::None
            }
            Call::EndVotingSession => {
                engine.end_voting_session(caller)?;
                CallOutput::None
            }
            Call::TallyVotes => CallOutput::ProposalId(engine.tally_votes(caller)?),
            Call::ResetVoting => {
                engine.reset_voting(caller)?;
                CallOutput::None
            }
            Call::TransferOwnership { new_owner } => {
                engine.transfer_ownership(caller, new_owner)?;
                CallOutput::None
            }
            query => return Self::read(engine, caller, &query).unwrap_or(Ok(CallOutput::None)),
        };
        Ok(output)
    }
}
