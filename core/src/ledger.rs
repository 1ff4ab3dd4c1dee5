//! Per-actor resource accounts.
//!
//! An account exists from the moment an actor joins a session until it
//! is settled (actor leaves, or the session ends). Crediting an actor
//! without an account is a `StaleActorReference` — callers skip that
//! actor and carry on.

use crate::{
    error::{SimError, SimResult},
    types::{ActorId, Millis},
    zone::ResourceKind,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceAccount {
    pub actor:         ActorId,
    totals:            BTreeMap<ResourceKind, u64>,
    last_distribution: BTreeMap<ResourceKind, Millis>,
    owned_zone_counts: BTreeMap<ResourceKind, u32>,
}

impl ResourceAccount {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            totals:            BTreeMap::new(),
            last_distribution: BTreeMap::new(),
            owned_zone_counts: BTreeMap::new(),
        }
    }

    pub fn total(&self, kind: ResourceKind) -> u64 {
        self.totals.get(&kind).copied().unwrap_or(0)
    }

    pub fn last_distribution(&self, kind: ResourceKind) -> Option<Millis> {
        self.last_distribution.get(&kind).copied()
    }

    /// Zones of `kind` the actor's team controlled at the last recount.
    pub fn owned_zones(&self, kind: ResourceKind) -> u32 {
        self.owned_zone_counts.get(&kind).copied().unwrap_or(0)
    }

    fn credit(&mut self, kind: ResourceKind, amount: u64) -> u64 {
        let total = self.totals.entry(kind).or_insert(0);
        *total = total.saturating_add(amount);
        *total
    }
}

/// Final balances handed back when an account is discarded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settlement {
    pub actor:  ActorId,
    pub totals: BTreeMap<ResourceKind, u64>,
}

impl Settlement {
    pub fn total(&self, kind: ResourceKind) -> u64 {
        self.totals.get(&kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountLedger {
    accounts: HashMap<ActorId, ResourceAccount>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account. Re-opening keeps the existing balances.
    pub fn open(&mut self, actor: ActorId) {
        self.accounts.entry(actor).or_insert_with(|| ResourceAccount::new(actor));
    }

    /// Discard an account, returning its final balances.
    pub fn close(&mut self, actor: &ActorId) -> Option<Settlement> {
        self.accounts.remove(actor).map(|account| Settlement {
            actor:  account.actor,
            totals: account.totals,
        })
    }

    /// Settle and discard every account, in actor-id order.
    pub fn close_all(&mut self) -> Vec<Settlement> {
        let mut actors: Vec<ActorId> = self.accounts.keys().copied().collect();
        actors.sort();
        actors.iter().filter_map(|actor| self.close(actor)).collect()
    }

    pub fn account(&self, actor: &ActorId) -> Option<&ResourceAccount> {
        self.accounts.get(actor)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Add `amount` of `kind`. Returns the new running total.
    pub fn credit(&mut self, actor: &ActorId, kind: ResourceKind, amount: u64) -> SimResult<u64> {
        let account = self.account_mut(actor)?;
        Ok(account.credit(kind, amount))
    }

    /// Credit a scheduled payout and stamp the distribution time.
    pub fn credit_distribution(
        &mut self,
        actor:  &ActorId,
        kind:   ResourceKind,
        amount: u64,
        at:     Millis,
    ) -> SimResult<u64> {
        let account = self.account_mut(actor)?;
        account.last_distribution.insert(kind, at);
        Ok(account.credit(kind, amount))
    }

    pub fn set_owned_zones(&mut self, actor: &ActorId, counts: &BTreeMap<ResourceKind, u32>) -> SimResult<()> {
        let account = self.account_mut(actor)?;
        account.owned_zone_counts = counts.clone();
        Ok(())
    }

    /// Zero every account's owned-zone counts.
    pub fn clear_owned_zones(&mut self) {
        for account in self.accounts.values_mut() {
            account.owned_zone_counts.clear();
        }
    }

    fn account_mut(&mut self, actor: &ActorId) -> SimResult<&mut ResourceAccount> {
        self.accounts
            .get_mut(actor)
            .ok_or(SimError::StaleActorReference { actor: *actor })
    }
}
