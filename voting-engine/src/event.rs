//! Engine notifications

use crate::status::WorkflowStatus;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use voting_core::{Address, ProposalId};

/// Notification emitted on every committed mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VotingEvent {
    /// Identity added to the allow-list
    VoterRegistered { voter: Address },
    /// Proposal appended at `proposal_id`
    ProposalRegistered { proposal_id: ProposalId },
    /// Workflow status changed
    WorkflowStatusChange {
        previous: WorkflowStatus,
        new: WorkflowStatus,
    },
    /// Vote recorded
    Voted {
        voter: Address,
        proposal_id: ProposalId,
    },
    /// Authority handed over
    OwnershipTransferred {
        previous: Address,
        new: Address,
    },
}

/// Append-only notification log with an optional live subscriber
#[derive(Debug, Default)]
pub struct EventLog {
    /// Events not yet drained
    pending: Vec<VotingEvent>,
    /// Live subscriber
    subscriber: Option<mpsc::UnboundedSender<VotingEvent>>,
}

impl EventLog {
    /// Create empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a live subscriber, replacing any previous one
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<VotingEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscriber = Some(tx);
        rx
    }

    /// Record an event and forward it to the subscriber
    pub fn emit(&mut self, event: VotingEvent) {
        if let Some(sender) = &self.subscriber {
            if sender.send(event.clone()).is_err() {
                warn!("Event subscriber dropped, detaching");
                self.subscriber = None;
            }
        }
        self.pending.push(event);
    }

    /// Take every pending event
    pub fn drain(&mut self) -> Vec<VotingEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Take the events recorded after the first `mark` pending ones,
    /// leaving the earlier ones in place
    pub fn drain_from(&mut self, mark: usize) -> Vec<VotingEvent> {
        if mark >= self.pending.len() {
            return Vec::new();
        }
        self.pending.split_off(mark)
    }

    /// Pending events
    pub fn pending(&self) -> &[VotingEvent] {
        &self.pending
    }
}
