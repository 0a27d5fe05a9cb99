//! Shipped scenarios load, run and replay cleanly.

use std::path::PathBuf;

use tank_core::prelude::*;
use tank_headless::{determinism_check, run_scenario, HeadlessRunner, Response, Scenario};
use tank_test_utils::determinism::verify_determinism;

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

#[test]
fn test_duel_scenario_records_and_verifies() {
    let scenario = Scenario::load(scenario_path("duel.ron")).unwrap();
    let run = run_scenario(&scenario, 120, true).unwrap();
    assert_eq!(run.outcome.ticks, 120);

    let blue = run
        .outcome
        .players
        .iter()
        .find(|p| p.nickname == "blue")
        .unwrap();
    assert!(blue.score >= 10, "blue should have landed a hit");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duel.replay");
    run.replay.unwrap().save(&path).unwrap();

    let replay = Replay::load(&path).unwrap();
    assert_eq!(replay.scenario_id, "duel");
    assert_eq!(replay.final_hash, run.outcome.final_hash);
    ReplayPlayer::new(replay).unwrap().verify().unwrap();
}

#[test]
fn test_duel_scenario_is_deterministic() {
    let scenario = Scenario::load(scenario_path("duel.ron")).unwrap();
    assert_eq!(determinism_check(&scenario, 200, 3).unwrap().len(), 1);

    let result = verify_determinism(
        2,
        200,
        || scenario.build().unwrap(),
        |prepared, tick| {
            let intents: Vec<_> = prepared.intents_at(tick).collect();
            for (player, intent) in intents {
                prepared.sim.apply_intent(player, intent).unwrap();
            }
            prepared.sim.tick().unwrap();
        },
        |prepared| prepared.sim.state_hash(),
    );
    result.assert_deterministic();
}

#[test]
fn test_scenario_file_written_at_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("open.ron");
    std::fs::write(
        &path,
        r#"(name: "open", config: (dim: 5, items_enabled: false), players: [(nickname: "solo")])"#,
    )
    .unwrap();

    let prepared = Scenario::load(&path).unwrap().build().unwrap();
    let solo = prepared.seats["solo"];
    assert!(prepared.sim.grid().tank_of(solo).is_some());
}

#[test]
fn test_serving_a_scenario() {
    let prepared = Scenario::duel().build().unwrap();
    let red = prepared.seats["red"];
    let mut runner = HeadlessRunner::new(prepared.sim);

    let input = format!(
        "{{\"cmd\":\"intent\",\"player\":{},\"intent\":{{\"UseAbility\":\"FireBullet\"}}}}\n\
         {{\"cmd\":\"step\",\"count\":5}}\n\
         {{\"cmd\":\"state\",\"player\":{}}}\n",
        red.0, red.0
    );
    let mut out = Vec::new();
    runner.run(input.as_bytes(), &mut out).unwrap();

    let responses: Vec<Response> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 4);
    assert!(matches!(responses[2], Response::Stepped { tick: 5, .. }));
    let Response::State { state, .. } = &responses[3] else {
        panic!("expected a state response");
    };
    assert_eq!(state.visibility.len(), 1);
    assert!(state.grid.tanks.iter().any(|t| t.owner == red));
}
