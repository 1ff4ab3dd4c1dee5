//! Wandering actors — a deterministic stand-in for real players.
//!
//! Each actor walks toward a target one block per axis at a time,
//! lingers there for a while, then picks a new target: usually a random
//! block inside a random zone, sometimes anywhere in the arena. Used by
//! the headless runner and by determinism tests.

use crate::{
    error::SimResult,
    occupancy::{Occupant, OccupancyDetector, PositionDetector},
    rng::SimRng,
    roster::TeamRoster,
    types::ActorId,
    zone::{Position, Zone, ZoneBounds},
};
use std::collections::BTreeMap;

/// Chance per tick that a walking actor actually moves.
const STEP_CHANCE: f64 = 0.25;
/// Chance that a new target is inside a zone rather than open ground.
const ZONE_BIAS: f64 = 0.8;
/// Longest linger at a target, in ticks.
const MAX_DWELL_TICKS: u64 = 400;

#[derive(Debug, Clone, Copy)]
struct Walker {
    pos:    Position,
    target: Position,
    dwell:  u64,
}

pub struct Wanderers {
    rng:      SimRng,
    arena:    ZoneBounds,
    walkers:  BTreeMap<ActorId, Walker>,
    detector: PositionDetector,
}

impl Wanderers {
    pub fn new(rng: SimRng, arena: ZoneBounds) -> Self {
        Self {
            rng,
            arena,
            walkers: BTreeMap::new(),
            detector: PositionDetector::new(),
        }
    }

    pub fn spawn(&mut self, actor: ActorId, at: Position) {
        self.walkers.insert(actor, Walker { pos: at, target: at, dwell: 0 });
        self.detector.set_position(actor, at);
    }

    pub fn remove(&mut self, actor: &ActorId) {
        self.walkers.remove(actor);
        self.detector.remove(actor);
    }

    pub fn position(&self, actor: &ActorId) -> Option<Position> {
        self.detector.position(actor)
    }

    /// Move every actor one tick.
    pub fn step(&mut self, zones: &[Zone]) {
        for (actor, walker) in self.walkers.iter_mut() {
            if walker.pos != walker.target {
                if self.rng.chance(STEP_CHANCE) {
                    walker.pos = step_toward(walker.pos, walker.target);
                    self.detector.set_position(*actor, walker.pos);
                }
                continue;
            }
            if walker.dwell > 0 {
                walker.dwell -= 1;
                continue;
            }
            walker.target = pick_target(&mut self.rng, zones, &self.arena);
            walker.dwell = self.rng.next_u64_below(MAX_DWELL_TICKS);
        }
    }
}

impl OccupancyDetector for Wanderers {
    fn occupants(&self, zone: &Zone, roster: &TeamRoster) -> SimResult<Vec<Occupant>> {
        self.detector.occupants(zone, roster)
    }
}

fn step_toward(from: Position, to: Position) -> Position {
    Position::new(
        from.x + (to.x - from.x).signum(),
        from.y + (to.y - from.y).signum(),
        from.z + (to.z - from.z).signum(),
    )
}

fn random_point(rng: &mut SimRng, bounds: &ZoneBounds) -> Position {
    let (min, max) = (bounds.min(), bounds.max());
    Position::new(
        rng.next_i32_between(min.x, max.x),
        rng.next_i32_between(min.y, max.y),
        rng.next_i32_between(min.z, max.z),
    )
}

fn pick_target(rng: &mut SimRng, zones: &[Zone], arena: &ZoneBounds) -> Position {
    if rng.chance(ZONE_BIAS) {
        if let Some(zone) = rng.pick(zones) {
            let bounds = zone.bounds;
            return random_point(rng, &bounds);
        }
    }
    random_point(rng, arena)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_one_block_per_axis() {
        let next = step_toward(Position::new(0, 64, 0), Position::new(5, 64, -3));
        assert_eq!(next, Position::new(1, 64, -1));
        let same = step_toward(Position::new(2, 2, 2), Position::new(2, 2, 2));
        assert_eq!(same, Position::new(2, 2, 2));
    }

    #[test]
    fn walkers_stay_inside_the_arena() {
        let arena = ZoneBounds::from_corners(Position::new(-20, 64, -20), Position::new(20, 64, 20));
        let zones = vec![Zone::new(
            "alpha",
            crate::zone::ResourceKind::Money,
            ZoneBounds::from_corners(Position::new(-3, 64, -3), Position::new(3, 64, 3)),
        )];
        let mut wanderers = Wanderers::new(SimRng::new(1, 1), arena);
        let actor = uuid::Uuid::from_u128(1);
        wanderers.spawn(actor, Position::new(15, 64, 15));

        for _ in 0..2_000 {
            wanderers.step(&zones);
            let pos = wanderers.position(&actor).unwrap();
            assert!(arena.contains(pos), "walked out of the arena to {pos:?}");
        }
    }
}
