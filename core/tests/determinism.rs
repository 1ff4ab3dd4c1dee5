//! Two engines, same seed, same wandering scenario.
//! They must produce byte-identical event logs.

use stormfront_core::{
    config::StormConfig,
    engine::SimEngine,
    rng::{RngBank, RngStream},
    wander::Wanderers,
    zone::{Position, ResourceKind, Zone, ZoneBounds},
};

const TICKS: u64 = 3_000;

fn square(cx: i32, cz: i32) -> ZoneBounds {
    ZoneBounds::from_corners(Position::new(cx - 3, 64, cz - 3), Position::new(cx + 3, 64, cz + 3))
}

/// Build an engine plus its wanderers and run the scenario to the end.
fn run_scenario(seed: u64) -> SimEngine {
    let mut engine = SimEngine::in_memory(format!("det-test-{seed}"), StormConfig::default_test())
        .expect("engine");
    engine.add_zone(Zone::new("north", ResourceKind::Money, square(0, -8))).expect("zone");
    engine.add_zone(Zone::new("south", ResourceKind::Money, square(0, 8))).expect("zone");
    engine.add_zone(Zone::new("forge", ResourceKind::Upgrade, square(8, 0))).expect("zone");

    let bank = RngBank::new(seed);
    let mut roster_rng = bank.stream(RngStream::Roster);
    let arena = ZoneBounds::from_corners(Position::new(-12, 64, -12), Position::new(12, 64, 12));
    let mut wanderers = Wanderers::new(bank.stream(RngStream::Wander), arena);

    for team in ["red", "blue"] {
        engine.add_team(team);
        for _ in 0..3 {
            let actor = roster_rng.next_uuid();
            engine.join(actor, team).expect("join");
            wanderers.spawn(actor, Position::new(0, 64, 0));
        }
    }

    engine.start(0).expect("start");
    let zones = engine.zones();
    for _ in 0..TICKS {
        wanderers.step(&zones);
        engine.tick(&wanderers).expect("tick");
    }
    engine
}

fn collect_event_log(engine: &SimEngine) -> Vec<String> {
    (0..=engine.clock.current_tick)
        .flat_map(|tick| {
            engine
                .store_events_for_tick(&engine.run_id, tick)
                .expect("read events")
                .into_iter()
                .map(|e| e.payload)
        })
        .collect()
}

#[test]
fn same_seed_produces_identical_event_logs() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;

    let log_a = collect_event_log(&run_scenario(SEED));
    let log_b = collect_event_log(&run_scenario(SEED));

    assert_eq!(
        log_a.len(), log_b.len(),
        "Event log lengths differ: {} vs {}",
        log_a.len(), log_b.len()
    );
    for (i, (a, b)) in log_a.iter().zip(log_b.iter()).enumerate() {
        assert_eq!(a, b, "Event log diverged at entry {i}:\n  A: {a}\n  B: {b}");
    }
}

#[test]
fn different_seeds_produce_different_logs() {
    let log_a = collect_event_log(&run_scenario(42));
    let log_b = collect_event_log(&run_scenario(99));

    let any_different = log_a.len() != log_b.len()
        || log_a.iter().zip(log_b.iter()).any(|(a, b)| a != b);
    assert!(any_different, "Different seeds produced identical logs; the seed is not being used");
}

#[test]
fn wanderers_actually_play() {
    let engine = run_scenario(7);
    let activity = engine
        .store()
        .events_of_type(&engine.run_id, "zone_claim_started")
        .expect("query");
    assert!(!activity.is_empty(), "nobody ever stepped into a zone in {TICKS} ticks");
}
