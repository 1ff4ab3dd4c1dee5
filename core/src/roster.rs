//! Team registry — who plays for whom.
//!
//! Passed explicitly into the scheduler, dispatcher and detectors as a
//! read view; the engine is the only writer.

use crate::{
    error::{SimError, SimResult},
    types::{ActorId, TeamId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub name: TeamId,
    members:  BTreeSet<ActorId>,
}

impl Team {
    pub fn new(name: impl Into<TeamId>) -> Self {
        Self { name: name.into(), members: BTreeSet::new() }
    }

    pub fn members(&self) -> impl Iterator<Item = &ActorId> {
        self.members.iter()
    }

    pub fn has_member(&self, actor: &ActorId) -> bool {
        self.members.contains(actor)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeamRoster {
    teams:    BTreeMap<TeamId, Team>,
    by_actor: BTreeMap<ActorId, TeamId>,
}

impl TeamRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering an existing team is a no-op.
    pub fn add_team(&mut self, name: impl Into<TeamId>) {
        let name = name.into();
        self.teams.entry(name.clone()).or_insert_with(|| Team::new(name));
    }

    /// Put `actor` on `team`, moving them off any previous team.
    /// Returns the team they left, if it was a different one.
    pub fn join(&mut self, actor: ActorId, team: &str) -> SimResult<Option<TeamId>> {
        if !self.teams.contains_key(team) {
            return Err(SimError::UnknownTeam { name: team.to_string() });
        }
        let previous = match self.by_actor.get(&actor).cloned() {
            Some(current) if current == team => return Ok(None),
            Some(_) => self.leave(&actor),
            None    => None,
        };
        if let Some(entry) = self.teams.get_mut(team) {
            entry.members.insert(actor);
        }
        self.by_actor.insert(actor, team.to_string());
        Ok(previous)
    }

    /// Remove `actor` from their team. Returns that team.
    pub fn leave(&mut self, actor: &ActorId) -> Option<TeamId> {
        let team = self.by_actor.remove(actor)?;
        if let Some(entry) = self.teams.get_mut(&team) {
            entry.members.remove(actor);
        }
        Some(team)
    }

    pub fn team_of(&self, actor: &ActorId) -> Option<&TeamId> {
        self.by_actor.get(actor)
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.get(name)
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    /// Every rostered actor, in id order.
    pub fn actors(&self) -> impl Iterator<Item = &ActorId> {
        self.by_actor.keys()
    }

    pub fn actor_count(&self) -> usize {
        self.by_actor.len()
    }
}
