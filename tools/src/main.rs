//! stormfront-runner: headless runner for Storm the Front.
//!
//! Builds a small arena with two teams and four checkpoints, lets
//! seeded wanderers walk around it, and prints the standings.
//!
//! Usage:
//!   stormfront-runner --seed 12345 --ticks 12000 --db run.db
//!   stormfront-runner --seed 12345 --config storm.json --players 4 --json

use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use stormfront_core::{
    config::StormConfig,
    engine::SimEngine,
    event::EndReason,
    ledger::Settlement,
    notify::LogSink,
    rng::{RngBank, RngStream},
    store::SimStore,
    wander::Wanderers,
    zone::{Position, ResourceKind, Zone, ZoneBounds},
};

const TEAMS: [&str; 2] = ["red", "blue"];
const VALUE_FLAGS: [&str; 5] = ["--seed", "--ticks", "--players", "--db", "--config"];

#[derive(Serialize)]
struct Standing {
    team:    String,
    members: usize,
    money:   u64,
    upgrade: u64,
}

#[derive(Serialize)]
struct RunSummary {
    run_id:     String,
    seed:       u64,
    ticks:      u64,
    final_time: u64,
    zones:      Vec<stormfront_core::status::ZoneStatus>,
    standings:  Vec<Standing>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    warn_unknown_flags(&args);
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 12_000u64);
    let players = parse_arg(&args, "--players", 3usize);
    let json = args.iter().any(|a| a == "--json");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let config = match flag_value(&args, "--config") {
        Some(path) => StormConfig::load(path)?,
        None => StormConfig::default(),
    };

    if !json {
        println!("Storm the Front — stormfront-runner");
        println!("  seed:     {seed}");
        println!("  ticks:    {ticks}");
        println!("  players:  {players} per team");
        println!("  db:       {db}");
        println!();
    }

    let started = chrono::Utc::now();
    let run_id = format!("run-{seed}-{}", started.format("%Y%m%dT%H%M%S"));
    let store = SimStore::open(db).with_context(|| format!("opening event log {db}"))?;
    store.migrate()?;
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"), &started.to_rfc3339())?;

    log::info!("run {run_id} starting (seed {seed}, {ticks} ticks)");
    let mut engine = SimEngine::new(run_id.clone(), config, store)?;
    engine.add_sink(Box::new(LogSink));
    for zone in arena_zones() {
        engine.add_zone(zone)?;
    }

    let bank = RngBank::new(seed);
    let mut roster_rng = bank.stream(RngStream::Roster);
    let arena = ZoneBounds::from_corners(Position::new(-40, 64, -40), Position::new(40, 64, 40));
    let mut wanderers = Wanderers::new(bank.stream(RngStream::Wander), arena);

    for (i, team) in TEAMS.iter().enumerate() {
        engine.add_team(*team);
        let spawn_x = if i == 0 { -35 } else { 35 };
        for _ in 0..players {
            let actor: uuid::Uuid = roster_rng.next_uuid();
            engine.join(actor, team)?;
            wanderers.spawn(actor, Position::new(spawn_x, 64, 0));
        }
    }

    engine.start(0)?;
    let zones = engine.zones();
    let mut ran = 0u64;
    while ran < ticks && engine.is_active() {
        wanderers.step(&zones);
        engine.tick(&wanderers)?;
        ran += 1;
    }

    if ran < ticks {
        log::warn!("session hit its time limit after {ran} of {ticks} ticks");
    }

    let statuses = engine.statuses();
    let settlements = if engine.is_active() {
        engine.end(EndReason::Manual)?
    } else {
        engine.settlements().to_vec()
    };

    let summary = RunSummary {
        run_id:     run_id.clone(),
        seed,
        ticks:      ran,
        final_time: engine.now(),
        zones:      statuses,
        standings:  standings(&engine, &settlements),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&engine, &summary)?;
    }
    Ok(())
}

fn arena_zones() -> Vec<Zone> {
    let square = |cx: i32, cz: i32| {
        ZoneBounds::from_corners(Position::new(cx - 4, 60, cz - 4), Position::new(cx + 4, 70, cz + 4))
    };
    vec![
        Zone::new("north_bank",  ResourceKind::Money,   square(0, -25)),
        Zone::new("south_bank",  ResourceKind::Money,   square(0, 25)),
        Zone::new("west_forge",  ResourceKind::Upgrade, square(-20, 0)),
        Zone::new("east_forge",  ResourceKind::Upgrade, square(20, 0)),
    ]
}

/// Team totals from the settled accounts. Actors who switched teams are
/// counted on the team they ended on.
fn standings(engine: &SimEngine, settlements: &[Settlement]) -> Vec<Standing> {
    engine
        .roster()
        .teams()
        .map(|team| {
            let mine: Vec<&Settlement> = settlements
                .iter()
                .filter(|s| team.has_member(&s.actor))
                .collect();
            Standing {
                team:    team.name.clone(),
                members: team.len(),
                money:   mine.iter().map(|s| s.total(ResourceKind::Money)).sum(),
                upgrade: mine.iter().map(|s| s.total(ResourceKind::Upgrade)).sum(),
            }
        })
        .collect()
}

fn print_summary(engine: &SimEngine, summary: &RunSummary) -> Result<()> {
    let captures = engine.store().events_of_type(&summary.run_id, "zone_captured")?;
    let events = engine.store().event_count(&summary.run_id)?;

    println!("=== RUN SUMMARY ===");
    println!("  run_id:      {}", summary.run_id);
    println!("  ticks run:   {}", summary.ticks);
    println!("  final time:  {:.1}s", summary.final_time as f64 / 1000.0);
    println!("  events:      {events}");
    println!("  captures:    {}", captures.len());

    println!();
    println!("=== ZONES AT FINAL TICK ===");
    for status in &summary.zones {
        println!("  {}", status.label);
    }

    println!();
    println!("=== STANDINGS ===");
    for s in &summary.standings {
        println!(
            "  {:<6} | members: {} | Money: {:>5} | Upgrade: {:>5}",
            s.team, s.members, s.money, s.upgrade
        );
    }
    Ok(())
}

fn warn_unknown_flags(args: &[String]) {
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            rest.next();
        } else if arg != "--json" {
            log::warn!("Unknown argument: {arg}");
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
