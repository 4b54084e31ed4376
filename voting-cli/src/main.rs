//! Command-line client for the voting engine.
//!
//! Builds an engine from a TOML configuration and replays a JSON scenario of
//! caller/call steps against it.
//!
//! ```sh
//! voting-cli init --authority 0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266 --output engine.toml
//! voting-cli run --config demos/engine.toml --scenario demos/round.json
//! ```

mod scenario;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scenario::{RunReport, Scenario};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voting_core::Address;
use voting_engine::{EngineConfig, SharedVotingEngine, VotingEngine, WorkflowStatus};

#[derive(Parser, Debug)]
#[command(name = "voting-cli", version, about = "Drive a voting round from the command line")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true, env = "VOTING_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write an engine configuration file
    Init {
        /// Administrator address
        #[arg(long)]
        authority: Address,
        /// Voter registered at construction
        #[arg(long)]
        initial_voter: Option<Address>,
        /// Destination file
        #[arg(long, default_value = "engine.toml")]
        output: PathBuf,
    },
    /// Replay a scenario against a fresh engine
    Run {
        /// Engine configuration (TOML or JSON)
        #[arg(long, env = "VOTING_CONFIG")]
        config: PathBuf,
        /// Scenario file (JSON)
        #[arg(long)]
        scenario: PathBuf,
        /// Stop at the first rejected step
        #[arg(long)]
        fail_fast: bool,
        /// Print step reports as JSON
        #[arg(long)]
        json: bool,
        /// Write the final engine snapshot (JSON) here
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Init {
            authority,
            initial_voter,
            output,
        } => {
            let mut config = EngineConfig::new(authority);
            config.initial_voter = initial_voter;
            config.validate()?;
            config
                .save_to_file(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Configuration written to {}", output.display());
        }
        Command::Run {
            config,
            scenario,
            fail_fast,
            json,
            snapshot,
        } => {
            let config = EngineConfig::load_from_file(&config)
                .with_context(|| format!("Failed to load {}", config.display()))?;
            let engine = SharedVotingEngine::new(VotingEngine::from_config(&config)?);
            let scenario = Scenario::load_from_file(&scenario)?;

            let report = scenario.run(&engine, fail_fast);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
                print_summary(&engine);
            }

            if let Some(path) = snapshot {
                let content = serde_json::to_string_pretty(&engine.snapshot())?;
                std::fs::write(&path, content)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Snapshot written to {}", path.display());
            }
        }
    }

    Ok(())
}

fn print_report(run: &RunReport) {
    for event in &run.setup_events {
        println!("[setup] event: {:?}", event);
    }
    for report in &run.steps {
        let mark = if report.result.success { "ok " } else { "ERR" };
        println!("[{}] #{} {} {:?}", mark, report.index, report.caller, report.call);
        if let Some(err) = &report.result.error {
            println!("        {}", err);
        }
        for event in &report.result.events {
            println!("        event: {:?}", event);
        }
    }
}

fn print_summary(engine: &SharedVotingEngine) {
    engine.read(|engine| {
        println!();
        println!("Status:  {}", engine.workflow_status());
        println!("Voters:  {}", engine.voters_count());
        println!("Owner:   {}", engine.owner());
        if engine.workflow_status() == WorkflowStatus::VotesTallied {
            if let (Ok(id), Ok(winner)) = (engine.winning_proposal_id(), engine.get_winner()) {
                println!(
                    "Winner:  #{} \"{}\" with {} vote(s)",
                    id, winner.description, winner.vote_count
                );
            }
        }
    });
}
