//! Headless tank arena runner.
//!
//! # Usage
//!
//! ```bash
//! # Serve a match over JSON lines on stdin/stdout
//! tank-headless serve --dim 16 --seed 42
//!
//! # Play a scenario for 600 ticks and record it
//! tank-headless run scenarios/duel.ron --ticks 600 --record duel.replay
//!
//! # Re-simulate a recording and compare the final hash
//! tank-headless verify duel.replay
//!
//! # Run a scenario several times and compare hashes
//! tank-headless determinism scenarios/duel.ron --runs 5
//! ```
//!
//! Logs go to stderr and honour `RUST_LOG`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tank_core::config::MatchConfig;
use tank_core::replay::{Replay, ReplayPlayer};
use tank_core::score::ScoringMode;
use tank_core::simulation::Simulation;
use tank_headless::{
    determinism_check, run_scenario, HeadlessRunner, Scenario, ScenarioError,
};

#[derive(Parser)]
#[command(name = "tank-headless")]
#[command(about = "Headless tank arena runner for bots, replays and CI")]
#[command(version)]
struct Cli {
    /// Enable debug logging to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scenario's script for a fixed number of ticks
    Run {
        /// Scenario file (RON)
        scenario: PathBuf,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,

        /// Write a replay of the run to this path
        #[arg(short, long)]
        record: Option<PathBuf>,
    },

    /// Re-simulate a replay and compare its final hash
    Verify {
        /// Replay file
        replay: PathBuf,
    },

    /// Serve a match over JSON lines on stdin/stdout
    Serve {
        /// Start from this scenario instead of an empty arena
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Arena side length for an empty arena
        #[arg(long, default_value = "24")]
        dim: i32,

        /// Match seed for an empty arena
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Use team scoring for an empty arena
        #[arg(long)]
        teams: bool,
    },

    /// Run a scenario several times and compare final hashes
    Determinism {
        /// Scenario file (RON)
        scenario: PathBuf,

        /// Ticks per run
        #[arg(short, long, default_value = "600")]
        ticks: u64,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout is reserved for the protocol
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            ticks,
            record,
        } => cmd_run(&scenario, ticks, record),
        Commands::Verify { replay } => cmd_verify(&replay),
        Commands::Serve {
            scenario,
            dim,
            seed,
            teams,
        } => cmd_serve(scenario, dim, seed, teams),
        Commands::Determinism {
            scenario,
            ticks,
            runs,
        } => cmd_determinism(&scenario, ticks, runs),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Play a scenario and print its outcome as JSON.
fn cmd_run(path: &Path, ticks: u64, record: Option<PathBuf>) -> Result<(), ScenarioError> {
    let scenario = Scenario::load(path)?;
    let run = run_scenario(&scenario, ticks, record.is_some())?;

    if let (Some(out), Some(replay)) = (record, run.replay.as_ref()) {
        replay.save(&out)?;
        tracing::info!(path = %out.display(), commands = replay.command_count(), "Replay saved");
    }

    match serde_json::to_string_pretty(&run.outcome) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::warn!("Failed to format outcome: {e}"),
    }
    Ok(())
}

/// Re-simulate a replay.
fn cmd_verify(path: &Path) -> Result<(), ScenarioError> {
    let replay = Replay::load(path)?;
    tracing::info!(
        scenario = %replay.scenario_id,
        seed = replay.seed,
        ticks = replay.final_tick,
        commands = replay.command_count(),
        "Verifying replay"
    );
    let final_tick = replay.final_tick;
    let final_hash = replay.final_hash;
    let mut player = ReplayPlayer::new(replay)?;
    player.verify()?;
    println!("OK: tick {final_tick}, hash {final_hash:#018x}");
    Ok(())
}

/// Serve a match until `quit` or end of input.
fn cmd_serve(
    scenario: Option<PathBuf>,
    dim: i32,
    seed: u64,
    teams: bool,
) -> Result<(), ScenarioError> {
    let sim = match scenario {
        Some(path) => Scenario::load(path)?.build()?.sim,
        None => {
            let config = MatchConfig {
                dim,
                seed,
                scoring: if teams {
                    ScoringMode::Team
                } else {
                    ScoringMode::Individual
                },
                ..MatchConfig::default()
            };
            config.validate()?;
            Simulation::new(config)
        }
    };
    tracing::info!("Starting interactive session");
    HeadlessRunner::new(sim).serve()?;
    Ok(())
}

/// Compare final hashes across repeated runs.
fn cmd_determinism(path: &Path, ticks: u64, runs: u32) -> Result<(), ScenarioError> {
    let scenario = Scenario::load(path)?;
    let hashes = determinism_check(&scenario, ticks, runs)?;
    if hashes.len() == 1 {
        println!("OK: {runs} runs of {ticks} ticks agree on {:#018x}", hashes[0]);
        Ok(())
    } else {
        Err(ScenarioError::Invalid(format!(
            "{runs} runs produced {} different hashes: {hashes:x?}",
            hashes.len()
        )))
    }
}
