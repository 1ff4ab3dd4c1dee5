//! Engine-level behaviour: session lifecycle, tick ordering, failure
//! isolation and the persisted event log.

use std::{cell::RefCell, rc::Rc};
use stormfront_core::{
    checkpoint::ZonePhase,
    config::StormConfig,
    engine::{SessionState, SimEngine},
    error::{SimError, SimResult},
    event::{EndReason, SimEvent},
    occupancy::{Occupant, OccupancyDetector, PrefetchedOccupancy},
    roster::TeamRoster,
    store::SimStore,
    zone::{Position, ResourceKind, Zone, ZoneBounds},
};
use uuid::Uuid;

const RED_1: Uuid = Uuid::from_u128(1);
const RED_2: Uuid = Uuid::from_u128(2);
const BLUE_1: Uuid = Uuid::from_u128(11);

fn zone(name: &str, kind: ResourceKind, x: i32) -> Zone {
    Zone::new(
        name,
        kind,
        ZoneBounds::from_corners(Position::new(x, 60, 0), Position::new(x + 8, 70, 8)),
    )
}

fn build(config: StormConfig) -> SimEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut engine = SimEngine::in_memory("engine-test", config).expect("engine");
    engine.add_zone(zone("bank", ResourceKind::Money, 0)).expect("bank");
    engine.add_zone(zone("forge", ResourceKind::Upgrade, 20)).expect("forge");
    engine.add_team("red");
    engine.add_team("blue");
    engine.join(RED_1, "red").expect("join");
    engine.join(RED_2, "red").expect("join");
    engine.join(BLUE_1, "blue").expect("join");
    engine
}

fn money(engine: &SimEngine, actor: &Uuid) -> u64 {
    engine.account(actor).map_or(0, |a| a.total(ResourceKind::Money))
}

fn upgrade(engine: &SimEngine, actor: &Uuid) -> u64 {
    engine.account(actor).map_or(0, |a| a.total(ResourceKind::Upgrade))
}

/// Fails for one named zone; puts RED_1 in every other zone.
struct CursedZone(&'static str);

impl OccupancyDetector for CursedZone {
    fn occupants(&self, zone: &Zone, _roster: &TeamRoster) -> SimResult<Vec<Occupant>> {
        if zone.name == self.0 {
            return Err(SimError::Other(anyhow::anyhow!("sensor offline")));
        }
        Ok(vec![Occupant::new(RED_1, "red")])
    }
}

// ── Setup & lifecycle ──────────────────────────────────────────────

#[test]
fn invalid_config_never_builds_an_engine() {
    let mut config = StormConfig::default_test();
    config.resources.money.distribution_interval_ms = 0;
    let err = SimEngine::in_memory("bad", config).err().expect("must be rejected");
    assert!(matches!(err, SimError::InvalidConfiguration { .. }), "got {err:?}");
}

#[test]
fn duplicate_zone_names_are_rejected() {
    let mut engine = build(StormConfig::default_test());
    let err = engine.add_zone(zone("bank", ResourceKind::Upgrade, 40)).unwrap_err();
    assert!(matches!(err, SimError::InvalidConfiguration { .. }));
    assert_eq!(engine.checkpoints().len(), 2);
}

#[test]
fn joining_an_unknown_team_fails() {
    let mut engine = build(StormConfig::default_test());
    let err = engine.join(Uuid::from_u128(99), "green").unwrap_err();
    assert!(matches!(err, SimError::UnknownTeam { .. }));
}

#[test]
fn start_grants_and_end_settles() {
    let mut config = StormConfig::default_test();
    config.resources.money.starting_grant = 1;
    config.resources.upgrade.starting_grant = 1;
    let mut engine = build(config);

    engine.start(0).expect("start");
    assert!(engine.is_active());
    assert_eq!(money(&engine, &RED_1), 1);
    assert_eq!(upgrade(&engine, &BLUE_1), 1);

    let settlements = engine.end(EndReason::Manual).expect("end");
    assert_eq!(settlements.len(), 3);
    assert!(settlements.iter().all(|s| s.total(ResourceKind::Money) == 1));
    assert!(engine.account(&RED_1).is_none(), "accounts are discarded at session end");
    assert!(matches!(engine.session(), SessionState::Ended { .. }));

    let err = engine.end(EndReason::Manual).unwrap_err();
    assert!(matches!(err, SimError::SessionNotActive));
}

#[test]
fn ticks_before_start_change_nothing() {
    let mut engine = build(StormConfig::default_test());
    let mut occupancy = PrefetchedOccupancy::new();
    occupancy.set("bank", vec![Occupant::new(RED_1, "red")]);
    for _ in 0..200 {
        engine.tick(&occupancy).expect("tick");
    }
    assert_eq!(engine.checkpoint("bank").expect("bank").phase(), &ZonePhase::Unclaimed);
}

#[test]
fn leaving_returns_the_settlement() {
    let mut engine = build(StormConfig::default_test());
    engine.start(0).expect("start");
    let mut occupancy = PrefetchedOccupancy::new();
    occupancy.set("bank", vec![Occupant::new(RED_1, "red"), Occupant::new(RED_2, "red")]);
    engine.run_ticks(101, &occupancy).expect("run");

    let settlement = engine.leave(&RED_2).expect("leave").expect("had an account");
    assert_eq!(settlement.total(ResourceKind::Money), 2, "capture bonus only, no payout yet");
    assert!(engine.roster().team_of(&RED_2).is_none());
    assert!(engine.leave(&RED_2).expect("second leave").is_none());
}

// ── Ticking ────────────────────────────────────────────────────────

#[test]
fn capture_pays_bonus_once_then_distribution_doubles() {
    let mut engine = build(StormConfig::default_test());
    engine.start(0).expect("start");
    let mut occupancy = PrefetchedOccupancy::new();
    occupancy.set("bank", vec![Occupant::new(RED_1, "red")]);

    // Claim starts on the first tick (t=100) and completes at t=10_100.
    engine.run_ticks(101, &occupancy).expect("run");
    assert_eq!(engine.checkpoint("bank").expect("bank").owner().map(String::as_str), Some("red"));
    assert_eq!(engine.tally().count("red", ResourceKind::Money), 1);
    assert_eq!(money(&engine, &RED_2), 2, "bonus reaches members outside the zone");

    // Next money payout is at t=11_000: base 1 doubled for one zone.
    engine.run_ticks(9, &occupancy).expect("run");
    assert_eq!(engine.now(), 11_000);
    assert_eq!(money(&engine, &RED_1), 4);
    assert_eq!(money(&engine, &RED_2), 4);
    assert_eq!(money(&engine, &BLUE_1), 0);

    let captures = engine
        .store()
        .events_of_type(&engine.run_id, "zone_captured")
        .expect("query");
    assert_eq!(captures.len(), 1, "a held zone is captured exactly once");
}

#[test]
fn stale_occupants_are_ignored() {
    let mut engine = build(StormConfig::default_test());
    engine.start(0).expect("start");
    let mut occupancy = PrefetchedOccupancy::new();
    occupancy.set("bank", vec![Occupant::new(Uuid::from_u128(404), "red")]);
    occupancy.set("forge", vec![Occupant::new(BLUE_1, "red")]);

    engine.run_ticks(50, &occupancy).expect("run");

    assert_eq!(engine.checkpoint("bank").expect("bank").phase(), &ZonePhase::Unclaimed);
    assert_eq!(engine.checkpoint("forge").expect("forge").phase(), &ZonePhase::Unclaimed);
}

#[test]
fn failing_zone_does_not_stop_its_siblings() {
    let mut engine = build(StormConfig::default_test());
    engine.start(0).expect("start");

    engine.run_ticks(101, &CursedZone("bank")).expect("a zone failure is not a tick failure");

    assert_eq!(engine.checkpoint("bank").expect("bank").phase(), &ZonePhase::Unclaimed);
    assert_eq!(
        engine.checkpoint("forge").expect("forge").owner().map(String::as_str),
        Some("red"),
        "the healthy zone still completes its claim"
    );
    assert_eq!(upgrade(&engine, &RED_2), 1);
}

#[test]
fn time_limit_ends_the_session() {
    let mut config = StormConfig::default_test();
    config.game_duration_ms = 2_000;
    let mut engine = build(config);
    engine.start(0).expect("start");

    engine.run_ticks(1_000, &PrefetchedOccupancy::new()).expect("run");

    assert!(!engine.is_active());
    assert_eq!(engine.now(), 2_000, "no ticks run after the session ends");
    assert_eq!(engine.settlements().len(), 3);
    let ended = engine
        .store()
        .events_of_type(&engine.run_id, "session_ended")
        .expect("query");
    assert_eq!(ended.len(), 1);
    assert!(ended[0].payload.contains("time_limit"), "payload: {}", ended[0].payload);
}

#[test]
fn host_time_drives_the_clock() {
    let mut engine = build(StormConfig::default_test());
    engine.start(1_000).expect("start");
    let mut occupancy = PrefetchedOccupancy::new();
    occupancy.set("forge", vec![Occupant::new(BLUE_1, "blue")]);

    engine.tick_at(1_500, &occupancy).expect("tick");
    engine.tick_at(11_499, &occupancy).expect("tick");
    assert!(engine.checkpoint("forge").expect("forge").owner().is_none());
    engine.tick_at(11_500, &occupancy).expect("tick");
    assert_eq!(
        engine.checkpoint("forge").expect("forge").owner().map(String::as_str),
        Some("blue")
    );
}

#[test]
fn sinks_see_every_event_and_statuses_follow() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_by_sink = Rc::clone(&seen);
    let mut engine = build(StormConfig::default_test());
    engine.add_sink(Box::new(move |e: &SimEvent| -> anyhow::Result<()> {
        seen_by_sink.borrow_mut().push(e.type_name());
        Ok(())
    }));
    engine.start(0).expect("start");

    let mut occupancy = PrefetchedOccupancy::new();
    occupancy.set("bank", vec![Occupant::new(RED_1, "red"), Occupant::new(BLUE_1, "blue")]);
    engine.tick(&occupancy).expect("tick");

    let seen = seen.borrow();
    assert_eq!(
        *seen,
        vec!["session_started", "tick_started", "zone_contested", "tick_completed"]
    );

    let statuses = engine.statuses();
    let bank = statuses.iter().find(|s| s.zone == "bank").expect("bank status");
    assert!(!bank.contested, "a contest over an idle zone leaves it unclaimed");
    assert_eq!(bank.phase, "unclaimed");
}

#[test]
fn every_event_is_persisted_with_its_tick() {
    let mut engine = build(StormConfig::default_test());
    engine.start(0).expect("start");
    engine.run_ticks(3, &PrefetchedOccupancy::new()).expect("run");

    let joins = engine.store_events_for_tick(&engine.run_id, 0).expect("tick 0");
    let types: Vec<&str> = joins.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, vec!["actor_joined", "actor_joined", "actor_joined", "session_started"]);

    let third = engine.store_events_for_tick(&engine.run_id, 3).expect("tick 3");
    assert_eq!(third.len(), 2);
    assert_eq!(third[0].source, "engine");
    assert_eq!(third[1].at, 300);
    assert_eq!(engine.store().event_count(&engine.run_id).expect("count"), 10);
}

#[test]
fn mid_session_joiner_inherits_team_territory() {
    let mut engine = build(StormConfig::default_test());
    engine.start(0).expect("start");
    let mut occupancy = PrefetchedOccupancy::new();
    occupancy.set("bank", vec![Occupant::new(RED_1, "red")]);
    engine.run_ticks(101, &occupancy).expect("run");
    assert_eq!(engine.tally().count("red", ResourceKind::Money), 1);

    let recruit = Uuid::from_u128(3);
    engine.join(recruit, "red").expect("join");

    let veteran = engine.account(&RED_1).expect("veteran account");
    let joiner = engine.account(&recruit).expect("joiner account");
    assert_eq!(veteran.owned_zones(ResourceKind::Money), 1);
    assert_eq!(joiner.owned_zones(ResourceKind::Money), 1, "new member sees the team's zones");
    assert_eq!(joiner.owned_zones(ResourceKind::Upgrade), 0);
}

#[test]
fn sinks_still_hear_events_the_store_rejects() {
    // No run row: every event_log insert fails its foreign key.
    let store = SimStore::in_memory().expect("store");
    store.migrate().expect("migration");
    let mut engine = SimEngine::new("unregistered".into(), StormConfig::default_test(), store)
        .expect("engine");
    engine.add_team("red");

    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_by_sink = Rc::clone(&seen);
    engine.add_sink(Box::new(move |e: &SimEvent| -> anyhow::Result<()> {
        seen_by_sink.borrow_mut().push(e.type_name());
        Ok(())
    }));

    let err = engine.join(RED_1, "red").unwrap_err();
    assert!(matches!(err, SimError::Database(_)), "got {err:?}");
    assert_eq!(*seen.borrow(), vec!["actor_joined"]);
}
