//! Scenario files: a caller/call script replayed against an engine

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use voting_core::Address;
use voting_engine::{Call, ExecutionResult, SharedVotingEngine, VotingEvent};

/// One scripted call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Identity submitting the call
    pub caller: Address,
    /// The call itself
    #[serde(flatten)]
    pub call: Call,
}

/// Ordered list of scripted calls
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Load a JSON scenario file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))
    }

    /// Replay every step, stopping at the first rejection when `fail_fast` is set.
    ///
    /// Notifications still pending on the engine, such as the pre-registration
    /// of configured voters, are reported as setup events.
    pub fn run(&self, engine: &SharedVotingEngine, fail_fast: bool) -> RunReport {
        let setup_events = engine.write(|engine| engine.take_events());
        let mut reports = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let result = engine.execute(&step.caller, step.call.clone());
            if result.success {
                info!("Step {} committed, {} event(s)", index, result.events.len());
            } else {
                warn!(
                    "Step {} rejected: {}",
                    index,
                    result.error.as_ref().map(|e| e.to_string()).unwrap_or_default()
                );
            }

            let failed = !result.success;
            reports.push(StepReport {
                index,
                caller: step.caller,
                call: step.call.clone(),
                result,
            });
            if failed && fail_fast {
                break;
            }
        }

        RunReport {
            setup_events,
            steps: reports,
        }
    }
}

/// Outcome of a replayed scenario
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Notifications emitted while the engine was built
    pub setup_events: Vec<VotingEvent>,
    /// One report per replayed step
    pub steps: Vec<StepReport>,
}

/// Outcome of one replayed step
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub caller: Address,
    pub call: Call,
    pub result: ExecutionResult,
}
