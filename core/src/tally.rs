//! Territory tally — how many zones of each kind every team controls.
//!
//! Recomputed from the checkpoints after every ownership change and
//! mirrored into each member's account. The distribution scheduler
//! reads it; nothing else does.

use crate::{
    checkpoint::Checkpoint,
    ledger::AccountLedger,
    roster::TeamRoster,
    types::TeamId,
    zone::ResourceKind,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerritoryTally {
    counts: BTreeMap<TeamId, BTreeMap<ResourceKind, u32>>,
}

impl TerritoryTally {
    /// Count `Controlled` zones per owner. Zones under attack or
    /// mid-claim count for nobody.
    pub fn from_checkpoints<'a>(checkpoints: impl IntoIterator<Item = &'a Checkpoint>) -> Self {
        let mut counts: BTreeMap<TeamId, BTreeMap<ResourceKind, u32>> = BTreeMap::new();
        for checkpoint in checkpoints {
            if let Some(owner) = checkpoint.owner() {
                *counts
                    .entry(owner.clone())
                    .or_default()
                    .entry(checkpoint.kind())
                    .or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    pub fn count(&self, team: &str, kind: ResourceKind) -> u32 {
        self.counts
            .get(team)
            .and_then(|by_kind| by_kind.get(&kind))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self, team: &str) -> u32 {
        self.counts.get(team).map_or(0, |by_kind| by_kind.values().sum())
    }

    /// Write each team's counts onto its members' accounts.
    /// Members without an account are skipped.
    pub fn sync_accounts(&self, roster: &TeamRoster, ledger: &mut AccountLedger) {
        let empty = BTreeMap::new();
        for team in roster.teams() {
            let counts = self.counts.get(&team.name).unwrap_or(&empty);
            for actor in team.members() {
                if let Err(e) = ledger.set_owned_zones(actor, counts) {
                    log::warn!("team {}: skipping owned-zone recount: {e}", team.name);
                }
            }
        }
    }
}
