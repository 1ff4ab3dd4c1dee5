//! Occupancy detection — the collaborator that answers "who is standing
//! in this zone right now".
//!
//! RULE: detectors never block. Hosts either answer from positions they
//! already hold (`PositionDetector`) or hand over a table filled in
//! before the tick begins (`PrefetchedOccupancy`).

use crate::{
    error::SimResult,
    roster::TeamRoster,
    types::{ActorId, TeamId, ZoneName},
    zone::{Position, Zone},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One actor inside a zone, attributed to a team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Occupant {
    pub actor: ActorId,
    pub team:  TeamId,
}

impl Occupant {
    pub fn new(actor: ActorId, team: impl Into<TeamId>) -> Self {
        Self { actor, team: team.into() }
    }
}

pub trait OccupancyDetector {
    /// Actors inside `zone` as of the current tick.
    fn occupants(&self, zone: &Zone, roster: &TeamRoster) -> SimResult<Vec<Occupant>>;
}

// ── Positions ──────────────────────────────────────────────────────

/// Answers from a table of last-known actor positions.
#[derive(Debug, Clone, Default)]
pub struct PositionDetector {
    positions: BTreeMap<ActorId, Position>,
}

impl PositionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&mut self, actor: ActorId, pos: Position) {
        self.positions.insert(actor, pos);
    }

    /// Forget an actor (logged off, died, left the arena).
    pub fn remove(&mut self, actor: &ActorId) {
        self.positions.remove(actor);
    }

    pub fn position(&self, actor: &ActorId) -> Option<Position> {
        self.positions.get(actor).copied()
    }
}

impl OccupancyDetector for PositionDetector {
    fn occupants(&self, zone: &Zone, roster: &TeamRoster) -> SimResult<Vec<Occupant>> {
        let occupants = self
            .positions
            .iter()
            .filter(|(_, pos)| zone.contains(**pos))
            .filter_map(|(actor, _)| match roster.team_of(actor) {
                Some(team) => Some(Occupant::new(*actor, team.clone())),
                None => {
                    log::trace!("zone {}: ignoring unaffiliated actor {actor}", zone.name);
                    None
                }
            })
            .collect();
        Ok(occupants)
    }
}

// ── Prefetched ─────────────────────────────────────────────────────

/// Occupancy gathered by the host before the tick starts.
/// Zones with no entry are empty.
#[derive(Debug, Clone, Default)]
pub struct PrefetchedOccupancy {
    by_zone: BTreeMap<ZoneName, Vec<Occupant>>,
}

impl PrefetchedOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, zone: impl Into<ZoneName>, occupants: Vec<Occupant>) {
        self.by_zone.insert(zone.into(), occupants);
    }

    pub fn clear_zone(&mut self, zone: &str) {
        self.by_zone.remove(zone);
    }

    pub fn clear(&mut self) {
        self.by_zone.clear();
    }
}

impl OccupancyDetector for PrefetchedOccupancy {
    fn occupants(&self, zone: &Zone, _roster: &TeamRoster) -> SimResult<Vec<Occupant>> {
        Ok(self.by_zone.get(&zone.name).cloned().unwrap_or_default())
    }
}
