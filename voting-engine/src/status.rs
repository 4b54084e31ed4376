//! Workflow status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Six-stage voting lifecycle, ordered from registration to tally
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum WorkflowStatus {
    #[default]
    RegisteringVoters = 0,
    ProposalsRegistrationStarted = 1,
    ProposalsRegistrationEnded = 2,
    VotingSessionStarted = 3,
    VotingSessionEnded = 4,
    VotesTallied = 5,
}

impl WorkflowStatus {
    /// Every status in lifecycle order
    pub const ALL: [WorkflowStatus; 6] = [
        WorkflowStatus::RegisteringVoters,
        WorkflowStatus::ProposalsRegistrationStarted,
        WorkflowStatus::ProposalsRegistrationEnded,
        WorkflowStatus::VotingSessionStarted,
        WorkflowStatus::VotingSessionEnded,
        WorkflowStatus::VotesTallied,
    ];

    /// Numeric stage (0..=5)
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Status for a numeric stage
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// The single forward step from this status, `None` at the terminal stage
    pub fn next(self) -> Option<Self> {
        Self::from_u8(self.as_u8() + 1)
    }

    /// Whether this is the terminal stage
    pub fn is_terminal(self) -> bool {
        self == WorkflowStatus::VotesTallied
    }

    /// Whether `to` is a legal transition from this status:
    /// one step forward, or the full reset from the terminal stage
    pub fn can_transition_to(self, to: WorkflowStatus) -> bool {
        self.next() == Some(to) || (self.is_terminal() && to == WorkflowStatus::RegisteringVoters)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStatus::RegisteringVoters => "RegisteringVoters",
            WorkflowStatus::ProposalsRegistrationStarted => "ProposalsRegistrationStarted",
            WorkflowStatus::ProposalsRegistrationEnded => "ProposalsRegistrationEnded",
            WorkflowStatus::VotingSessionStarted => "VotingSessionStarted",
            WorkflowStatus::VotingSessionEnded => "VotingSessionEnded",
            WorkflowStatus::VotesTallied => "VotesTallied",
        };
        write!(f, "{}({})", name, self.as_u8())
    }
}
