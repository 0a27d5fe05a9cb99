//! Batch execution of scripted scenarios.
//!
//! [`run_scenario`] plays a scenario's script for a fixed number of ticks,
//! optionally recording a [`Replay`], and reports the outcome.

use serde::{Deserialize, Serialize};

use tank_core::replay::Replay;
use tank_core::simulation::Simulation;
use tank_core::zone::ZoneState;

use crate::scenario::{Scenario, ScenarioError};

/// Final standing of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerOutcome {
    /// Nickname.
    pub nickname: String,
    /// Player id.
    pub player: u32,
    /// Final score.
    pub score: i64,
    /// Kills.
    pub kills: u32,
}

/// Result of a scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Scenario name.
    pub scenario: String,
    /// Ticks simulated.
    pub ticks: u64,
    /// State hash at the end.
    pub final_hash: u64,
    /// Players by id.
    pub players: Vec<PlayerOutcome>,
    /// Zone owners at the end, by zone label.
    pub zones: Vec<(char, Option<u32>)>,
}

/// A finished run and, when requested, its recording.
#[derive(Debug)]
pub struct FinishedRun {
    /// Outcome summary.
    pub outcome: RunOutcome,
    /// The final state.
    pub simulation: Simulation,
    /// Recording of the run.
    pub replay: Option<Replay>,
}

/// Play `scenario` for `ticks` ticks.
///
/// # Errors
///
/// Returns an error if the scenario does not build, or a tick or replay
/// operation fails.
pub fn run_scenario(
    scenario: &Scenario,
    ticks: u64,
    record: bool,
) -> Result<FinishedRun, ScenarioError> {
    let prepared = scenario.build()?;
    let mut replay = if record {
        Some(Replay::new(scenario.name.clone(), &prepared.sim)?)
    } else {
        None
    };
    let mut sim = prepared.sim.clone();

    for _ in 0..ticks {
        let tick = sim.get_tick();
        for (player, intent) in prepared.intents_at(tick) {
            if let Some(replay) = replay.as_mut() {
                replay.record(tick, player, intent);
            }
            sim.apply_intent(player, intent)?;
        }
        sim.tick()?;
    }
    if let Some(replay) = replay.as_mut() {
        replay.finalize(&sim);
    }

    let outcome = summarize(scenario, &sim);
    tracing::info!(
        scenario = %outcome.scenario,
        ticks = outcome.ticks,
        hash = outcome.final_hash,
        "Scenario finished"
    );
    Ok(FinishedRun {
        outcome,
        simulation: sim,
        replay,
    })
}

/// Run `scenario` `runs` times and return the distinct final hashes.
///
/// A deterministic scenario yields exactly one hash.
///
/// # Errors
///
/// Returns the first failure of any run.
pub fn determinism_check(
    scenario: &Scenario,
    ticks: u64,
    runs: u32,
) -> Result<Vec<u64>, ScenarioError> {
    let mut hashes = Vec::new();
    for _ in 0..runs {
        hashes.push(run_scenario(scenario, ticks, false)?.outcome.final_hash);
    }
    hashes.sort_unstable();
    hashes.dedup();
    Ok(hashes)
}

fn summarize(scenario: &Scenario, sim: &Simulation) -> RunOutcome {
    RunOutcome {
        scenario: scenario.name.clone(),
        ticks: sim.get_tick(),
        final_hash: sim.state_hash(),
        players: sim
            .roster()
            .players()
            .map(|p| PlayerOutcome {
                nickname: p.nickname.clone(),
                player: p.id.0,
                score: p.score,
                kills: p.kills,
            })
            .collect(),
        zones: sim
            .grid()
            .zones
            .iter()
            .map(|z| {
                let owner = match z.state {
                    ZoneState::Captured { player } => Some(player.0),
                    ZoneState::BeingRetaken { captured_by, .. } => Some(captured_by.0),
                    ZoneState::BeingContested { captured_by } => captured_by.map(|p| p.0),
                    _ => None,
                };
                (z.index, owner)
            })
            .collect(),
    }
}
