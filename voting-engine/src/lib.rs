//! Voting workflow engine
//!
//! This crate provides the authority-gated voting state machine: voter and
//! proposal registries, the six-stage workflow, the tally, and the
//! notification channel observers read from.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod executor;
pub mod guard;
pub mod proposal;
pub mod state;
pub mod status;
pub mod voter;

pub use config::EngineConfig;
pub use engine::VotingEngine;
pub use error::{VotingError, VotingResult};
pub use event::{EventLog, VotingEvent};
pub use executor::{Call, CallExecutor, CallOutput, ExecutionResult};
pub use guard::{OperationGuard, ReentrancyGuard};
pub use proposal::{Proposal, ProposalRegistry, GENESIS_DESCRIPTION};
pub use state::{EngineSnapshot, SharedVotingEngine};
pub use status::WorkflowStatus;
pub use voter::{Voter, VoterRegistry};
