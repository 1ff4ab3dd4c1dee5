//! Contest resolver — classifies who is standing in a zone.
//!
//! Pure: no stored state. The per-team presence bookkeeping that the
//! classification implies is applied by `Checkpoint::advance` when it
//! receives `Occupancy::Single`.

use crate::{occupancy::Occupant, types::TeamId};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupancy {
    Empty,
    Single(TeamId),
    Contested(BTreeSet<TeamId>),
}

impl Occupancy {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Teams present, in name order.
    pub fn teams(&self) -> Vec<TeamId> {
        match self {
            Self::Empty            => Vec::new(),
            Self::Single(team)     => vec![team.clone()],
            Self::Contested(teams) => teams.iter().cloned().collect(),
        }
    }
}

/// Collapse occupants to the distinct teams they belong to.
/// Several actors of one team count as one team.
pub fn classify(occupants: &[Occupant]) -> Occupancy {
    classify_teams(occupants.iter().map(|o| o.team.as_str()))
}

/// Convenience for callers that already reduced occupancy to team names.
pub fn classify_teams<'a>(teams: impl IntoIterator<Item = &'a str>) -> Occupancy {
    let mut teams: BTreeSet<TeamId> = teams.into_iter().map(str::to_string).collect();
    match teams.len() {
        0 => Occupancy::Empty,
        1 => match teams.pop_first() {
            Some(team) => Occupancy::Single(team),
            None       => Occupancy::Empty,
        },
        _ => Occupancy::Contested(teams),
    }
}
