//! Voting engine error types

use crate::status::WorkflowStatus;
use serde::Serialize;
use thiserror::Error;
use voting_core::{Address, ProposalId};

/// Voting engine error type
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VotingError {
    /// Caller is not the authority
    #[error("Unauthorized caller: {caller}")]
    Unauthorized { caller: Address },

    /// Caller is not a registered voter
    #[error("Not a registered voter: {caller}")]
    NotAVoter { caller: Address },

    /// Null identity supplied
    #[error("Invalid identity: the zero address cannot be used")]
    InvalidIdentity,

    /// Identity already in the voter registry
    #[error("Already registered: {0}")]
    AlreadyRegistered(Address),

    /// Voter registration is closed
    #[error("Voters registration is not open")]
    RegistrationNotOpen,

    /// Proposal registration has not been opened
    #[error("Proposals registration has not started")]
    RegistrationNotStarted,

    /// Proposal description is empty
    #[error("Proposal description cannot be empty")]
    EmptyProposal,

    /// Proposal index out of bounds
    #[error("Proposal not found: {id} (count {count})")]
    ProposalNotFound { id: ProposalId, count: usize },

    /// Workflow transition from the wrong status
    #[error("Invalid workflow status: expected {expected}, current {actual}")]
    InvalidWorkflowStatus {
        expected: WorkflowStatus,
        actual: WorkflowStatus,
    },

    /// Vote attempted outside the voting session
    #[error("Voting session has not started")]
    VotingSessionNotStarted,

    /// Tally attempted before the voting session ended
    #[error("Voting session has not ended")]
    VotingSessionNotEnded,

    /// Second vote in the same round
    #[error("Voter has already voted: {0}")]
    AlreadyVoted(Address),

    /// Guarded operation entered while already in progress
    #[error("Re-entrant call rejected")]
    ReentrantCall,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for VotingError {
    fn from(err: bincode::Error) -> Self {
        VotingError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for VotingError {
    fn from(err: serde_json::Error) -> Self {
        VotingError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for VotingError {
    fn from(err: toml::de::Error) -> Self {
        VotingError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VotingError {
    fn from(err: toml::ser::Error) -> Self {
        VotingError::Config(err.to_string())
    }
}

impl From<voting_core::CoreError> for VotingError {
    fn from(err: voting_core::CoreError) -> Self {
        VotingError::Config(err.to_string())
    }
}

/// Result type for voting operations
pub type VotingResult<T> = Result<T, VotingError>;
