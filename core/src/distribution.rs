//! Resource distribution scheduler.
//!
//! One fixed-interval timer per resource kind. When a timer fires, every
//! team that controls at least one zone of that kind is paid
//! `base * 2^owned` per member.
//!
//! RULES:
//!   - The timer resets on every firing, whether or not anyone qualified
//!     and whether or not every credit succeeded.
//!   - A stale member is logged and skipped; the rest of the team and
//!     every other team are still paid.

use crate::{
    config::StormConfig,
    event::SimEvent,
    ledger::AccountLedger,
    roster::TeamRoster,
    tally::TerritoryTally,
    types::Millis,
    zone::ResourceKind,
};
use serde::{Deserialize, Serialize};

/// Payout for a team owning `owned` zones of a kind.
/// `None` when the team owns none (no payout at all).
pub fn payout(base: u64, owned: u32) -> Option<u64> {
    if owned == 0 {
        return None;
    }
    let multiplier = 1u64.checked_shl(owned).unwrap_or(u64::MAX);
    Some(base.saturating_mul(multiplier))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntervalTimer {
    pub kind:          ResourceKind,
    pub interval:      Millis,
    pub base_amount:   u64,
    pub last_fired_at: Millis,
}

impl IntervalTimer {
    pub fn is_due(&self, now: Millis) -> bool {
        now.saturating_sub(self.last_fired_at) >= self.interval
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionScheduler {
    timers: Vec<IntervalTimer>,
}

impl DistributionScheduler {
    pub fn from_config(config: &StormConfig, now: Millis) -> Self {
        let timers = ResourceKind::ALL
            .iter()
            .map(|&kind| {
                let resource = config.resource(kind);
                IntervalTimer {
                    kind,
                    interval:      resource.distribution_interval_ms,
                    base_amount:   resource.base_distribution_amount,
                    last_fired_at: now,
                }
            })
            .collect();
        Self { timers }
    }

    /// Restart every interval from `now`.
    pub fn arm(&mut self, now: Millis) {
        for timer in &mut self.timers {
            timer.last_fired_at = now;
        }
    }

    pub fn timer(&self, kind: ResourceKind) -> Option<&IntervalTimer> {
        self.timers.iter().find(|t| t.kind == kind)
    }

    /// Fire every due timer.
    pub fn run(
        &mut self,
        now:    Millis,
        tally:  &TerritoryTally,
        roster: &TeamRoster,
        ledger: &mut AccountLedger,
    ) -> Vec<SimEvent> {
        let mut out = Vec::new();

        for timer in &mut self.timers {
            if !timer.is_due(now) {
                continue;
            }

            for team in roster.teams() {
                let owned = tally.count(&team.name, timer.kind);
                let Some(amount) = payout(timer.base_amount, owned) else {
                    continue;
                };

                let mut paid = 0usize;
                for actor in team.members() {
                    match ledger.credit_distribution(actor, timer.kind, amount, now) {
                        Ok(_)  => paid += 1,
                        Err(e) => log::warn!(
                            "t={now} {} payout to {}: skipping member: {e}",
                            timer.kind, team.name
                        ),
                    }
                }

                log::info!(
                    "t={now} {} +{amount} to {} ({owned} zone(s), x{}, {paid}/{} paid)",
                    timer.kind, team.name, 1u64.checked_shl(owned).unwrap_or(u64::MAX), team.len()
                );
                out.push(SimEvent::ResourceDistributed {
                    at:          now,
                    team:        team.name.clone(),
                    kind:        timer.kind,
                    amount,
                    owned_count: owned,
                });
            }

            timer.last_fired_at = now;
        }

        out
    }
}
