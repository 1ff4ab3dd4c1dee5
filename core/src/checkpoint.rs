//! Checkpoint state machine — one instance per zone.
//!
//! Each tick `advance()` receives the classified occupancy and moves the
//! zone through:
//!
//!   Unclaimed ──► Claiming ──► Controlled ──► Clearing ──► Claiming ──► …
//!                    ▲  │                        │  ▲
//!                    │  └──────► Contested ◄─────┘  │
//!                    └──────────────┴───────────────┘
//!
//! RULES:
//!   - Progress is never stored. It is derived from the attempt's start
//!     time and pause ledger every time it is read.
//!   - Only contest pauses progress. An empty zone keeps accruing until
//!     the abandon timeout resets it.
//!   - Contested has no abandonment clock.
//!   - Only `Claiming` completion produces a `CaptureEvent`.

use crate::{
    config::CheckpointTiming,
    contest::Occupancy,
    event::SimEvent,
    types::{Millis, TeamId, ZoneName},
    zone::{ResourceKind, Zone},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which kind of timed attempt a zone is running.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttemptKind {
    Claim,
    Clear,
}

/// A timed claim or clear by one team.
///
/// `holder` is the owner of record at the time the attempt began. It is
/// what decides Claim vs Clear when a contest resolves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attempt {
    pub team:              TeamId,
    pub holder:            Option<TeamId>,
    pub started_at:        Millis,
    pub accumulated_pause: Millis,
    pub paused_since:      Option<Millis>,
    pub last_presence:     Millis,
}

impl Attempt {
    fn begin(team: TeamId, holder: Option<TeamId>, now: Millis) -> Self {
        Self {
            team,
            holder,
            started_at:        now,
            accumulated_pause: 0,
            paused_since:      None,
            last_presence:     now,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_since.is_some()
    }

    /// All paused time in this attempt, including a pause still open at `now`.
    pub fn paused_total(&self, now: Millis) -> Millis {
        let open = self.paused_since.map_or(0, |since| now.saturating_sub(since));
        self.accumulated_pause + open
    }

    /// Time that counts toward completion.
    pub fn effective_elapsed(&self, now: Millis) -> Millis {
        now.saturating_sub(self.started_at)
            .saturating_sub(self.paused_total(now))
    }

    /// Percentage in [0, 100].
    pub fn progress(&self, now: Millis, claim_duration: Millis) -> f64 {
        if claim_duration == 0 {
            return 100.0;
        }
        let pct = self.effective_elapsed(now) as f64 / claim_duration as f64 * 100.0;
        pct.clamp(0.0, 100.0)
    }

    /// Integer comparison so completion never depends on float rounding.
    pub fn is_complete(&self, now: Millis, claim_duration: Millis) -> bool {
        self.effective_elapsed(now) >= claim_duration
    }

    fn pause(&mut self, now: Millis) {
        if self.paused_since.is_none() {
            self.paused_since = Some(now);
        }
    }

    fn resume(&mut self, now: Millis) {
        if let Some(since) = self.paused_since.take() {
            self.accumulated_pause += now.saturating_sub(since);
        }
    }
}

/// The five mutually exclusive zone states.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ZonePhase {
    Unclaimed,
    Claiming(Attempt),
    Clearing(Attempt),
    Controlled { owner: TeamId },
    /// A paused attempt plus the teams currently fighting over it.
    Contested {
        interrupted: AttemptKind,
        attempt:     Attempt,
        teams:       BTreeSet<TeamId>,
    },
}

impl ZonePhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unclaimed         => "unclaimed",
            Self::Claiming(_)       => "claiming",
            Self::Clearing(_)       => "clearing",
            Self::Controlled { .. } => "controlled",
            Self::Contested { .. }  => "contested",
        }
    }

    /// The running (or frozen) attempt, if any.
    pub fn attempt(&self) -> Option<&Attempt> {
        match self {
            Self::Claiming(a) | Self::Clearing(a) => Some(a),
            Self::Contested { attempt, .. }       => Some(attempt),
            Self::Unclaimed | Self::Controlled { .. } => None,
        }
    }

    /// Team whose attempt is running (or frozen).
    pub fn acting_team(&self) -> Option<&TeamId> {
        self.attempt().map(|a| &a.team)
    }

    /// The team that currently owns the zone for reward purposes.
    pub fn owner(&self) -> Option<&TeamId> {
        match self {
            Self::Controlled { owner } => Some(owner),
            _ => None,
        }
    }

    /// The owner of record: the current owner, or the team an attempt
    /// is trying to displace.
    pub fn holder(&self) -> Option<&TeamId> {
        match self {
            Self::Controlled { owner } => Some(owner),
            _ => self.attempt().and_then(|a| a.holder.as_ref()),
        }
    }
}

/// Emitted exactly once when a claim completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureEvent {
    pub zone:           ZoneName,
    pub kind:           ResourceKind,
    pub team:           TeamId,
    pub previous_owner: Option<TeamId>,
    pub at:             Millis,
}

/// Everything one `advance()` call produced.
#[derive(Debug, Default)]
pub struct ZoneStep {
    pub notices:           Vec<SimEvent>,
    pub capture:           Option<CaptureEvent>,
    /// The set of zones counted as owned changed.
    pub ownership_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    zone:                  Zone,
    timing:                CheckpointTiming,
    phase:                 ZonePhase,
    last_contested_notice: Option<Millis>,
}

impl Checkpoint {
    pub fn new(zone: Zone, timing: CheckpointTiming) -> Self {
        Self {
            zone,
            timing,
            phase: ZonePhase::Unclaimed,
            last_contested_notice: None,
        }
    }

    pub fn zone(&self) -> &Zone         { &self.zone }
    pub fn name(&self) -> &str          { &self.zone.name }
    pub fn kind(&self) -> ResourceKind  { self.zone.kind }
    pub fn phase(&self) -> &ZonePhase   { &self.phase }
    pub fn timing(&self) -> CheckpointTiming { self.timing }

    pub fn owner(&self) -> Option<&TeamId> {
        self.phase.owner()
    }

    /// Progress in [0, 100] as of `now`.
    pub fn progress(&self, now: Millis) -> f64 {
        match &self.phase {
            ZonePhase::Unclaimed         => 0.0,
            ZonePhase::Controlled { .. } => 100.0,
            ZonePhase::Claiming(a) | ZonePhase::Clearing(a) => {
                a.progress(now, self.timing.claim_duration)
            }
            ZonePhase::Contested { attempt, .. } => {
                attempt.progress(now, self.timing.claim_duration)
            }
        }
    }

    /// Back to Unclaimed with zeroed timers. Used when a session ends.
    pub fn reset(&mut self) {
        self.phase = ZonePhase::Unclaimed;
        self.last_contested_notice = None;
    }

    /// Advance one tick.
    pub fn advance(&mut self, now: Millis, occupancy: &Occupancy) -> ZoneStep {
        let mut step = ZoneStep::default();
        match occupancy {
            Occupancy::Empty            => self.on_empty(now, &mut step),
            Occupancy::Single(team)     => self.on_single(now, team, &mut step),
            Occupancy::Contested(teams) => self.on_contested(now, teams, &mut step),
        }
        step
    }

    fn on_empty(&mut self, now: Millis, step: &mut ZoneStep) {
        let abandoned_by = match &self.phase {
            ZonePhase::Claiming(a) | ZonePhase::Clearing(a)
                if now.saturating_sub(a.last_presence) > self.timing.abandon_timeout =>
            {
                Some(a.team.clone())
            }
            _ => None,
        };

        if let Some(team) = abandoned_by {
            log::info!("t={now} zone {}: abandoned by {team}, reset to unclaimed", self.zone.name);
            self.phase = ZonePhase::Unclaimed;
            step.notices.push(SimEvent::ZoneAbandoned {
                at:   now,
                zone: self.zone.name.clone(),
                team,
            });
        }
    }

    fn on_single(&mut self, now: Millis, team: &TeamId, step: &mut ZoneStep) {
        let zone = self.zone.name.clone();
        let phase = std::mem::replace(&mut self.phase, ZonePhase::Unclaimed);

        self.phase = match phase {
            ZonePhase::Unclaimed => {
                log::debug!("t={now} zone {zone}: {team} starts claiming");
                step.notices.push(SimEvent::ZoneClaimStarted {
                    at: now, zone: zone.clone(), team: team.clone(),
                });
                ZonePhase::Claiming(Attempt::begin(team.clone(), None, now))
            }

            ZonePhase::Controlled { owner } if owner == *team => ZonePhase::Controlled { owner },

            ZonePhase::Controlled { owner } => {
                log::debug!("t={now} zone {zone}: {team} starts clearing {owner}");
                step.ownership_changed = true;
                step.notices.push(SimEvent::ZoneClearingStarted {
                    at: now, zone: zone.clone(), team: team.clone(), defender: Some(owner.clone()),
                });
                ZonePhase::Clearing(Attempt::begin(team.clone(), Some(owner), now))
            }

            ZonePhase::Claiming(mut a) if a.team == *team => {
                a.last_presence = now;
                ZonePhase::Claiming(a)
            }

            ZonePhase::Clearing(mut a) if a.team == *team => {
                a.last_presence = now;
                ZonePhase::Clearing(a)
            }

            // A different team replaced the acting one. The switch is
            // deliberately crosswise: an interrupted claim becomes a clear
            // and an interrupted clear becomes a claim.
            ZonePhase::Claiming(a) => {
                log::debug!("t={now} zone {zone}: {team} interrupts {}'s claim", a.team);
                step.notices.push(SimEvent::ZoneClearingStarted {
                    at: now, zone: zone.clone(), team: team.clone(), defender: a.holder.clone(),
                });
                ZonePhase::Clearing(Attempt::begin(team.clone(), a.holder, now))
            }

            ZonePhase::Clearing(a) => {
                log::debug!("t={now} zone {zone}: {team} interrupts {}'s clear", a.team);
                step.notices.push(SimEvent::ZoneClaimStarted {
                    at: now, zone: zone.clone(), team: team.clone(),
                });
                ZonePhase::Claiming(Attempt::begin(team.clone(), a.holder, now))
            }

            // Timers carry over: the frozen progress resumes, it is not reset.
            ZonePhase::Contested { mut attempt, .. } => {
                attempt.resume(now);
                attempt.last_presence = now;
                attempt.team = team.clone();
                let progress = attempt.progress(now, self.timing.claim_duration);
                log::debug!("t={now} zone {zone}: contest over, {team} resumes at {progress:.1}%");
                step.notices.push(SimEvent::ZoneResumed {
                    at: now, zone: zone.clone(), team: team.clone(), progress,
                });
                let against_owner = matches!(&attempt.holder, Some(holder) if holder != team);
                if against_owner {
                    ZonePhase::Clearing(attempt)
                } else {
                    ZonePhase::Claiming(attempt)
                }
            }
        };

        self.complete_if_due(now, step);
    }

    fn complete_if_due(&mut self, now: Millis, step: &mut ZoneStep) {
        let due = match &self.phase {
            ZonePhase::Claiming(a) | ZonePhase::Clearing(a) => {
                a.is_complete(now, self.timing.claim_duration)
            }
            _ => false,
        };
        if !due {
            return;
        }

        let zone = self.zone.name.clone();
        let phase = std::mem::replace(&mut self.phase, ZonePhase::Unclaimed);
        self.phase = match phase {
            // The attacker still owes a full claim after clearing.
            ZonePhase::Clearing(a) => {
                log::info!("t={now} zone {zone}: cleared by {}, claim restarts", a.team);
                step.notices.push(SimEvent::ZoneCleared {
                    at: now, zone, team: a.team.clone(), previous_owner: a.holder,
                });
                ZonePhase::Claiming(Attempt::begin(a.team, None, now))
            }
            ZonePhase::Claiming(a) => {
                log::info!("t={now} zone {zone}: captured by {}", a.team);
                step.ownership_changed = true;
                step.capture = Some(CaptureEvent {
                    zone,
                    kind:           self.zone.kind,
                    team:           a.team.clone(),
                    previous_owner: a.holder,
                    at:             now,
                });
                ZonePhase::Controlled { owner: a.team }
            }
            other => other,
        };
    }

    fn on_contested(&mut self, now: Millis, teams: &BTreeSet<TeamId>, step: &mut ZoneStep) {
        let phase = std::mem::replace(&mut self.phase, ZonePhase::Unclaimed);
        self.phase = match phase {
            ZonePhase::Claiming(mut attempt) => {
                attempt.pause(now);
                ZonePhase::Contested { interrupted: AttemptKind::Claim, attempt, teams: teams.clone() }
            }
            ZonePhase::Clearing(mut attempt) => {
                attempt.pause(now);
                ZonePhase::Contested { interrupted: AttemptKind::Clear, attempt, teams: teams.clone() }
            }
            ZonePhase::Contested { interrupted, attempt, .. } => {
                ZonePhase::Contested { interrupted, attempt, teams: teams.clone() }
            }
            // Fighting over an idle or owned zone changes nothing.
            other => other,
        };

        let cooled_down = self.last_contested_notice.map_or(true, |last| {
            now.saturating_sub(last) > self.timing.contested_notice_cooldown
        });
        if cooled_down {
            log::debug!("t={now} zone {}: contested by {teams:?}", self.zone.name);
            self.last_contested_notice = Some(now);
            step.notices.push(SimEvent::ZoneContested {
                at:    now,
                zone:  self.zone.name.clone(),
                teams: teams.iter().cloned().collect(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt_at(started_at: Millis) -> Attempt {
        Attempt::begin("red".into(), None, started_at)
    }

    #[test]
    fn pause_ledger_sums_every_interval_once() {
        let mut a = attempt_at(0);
        a.pause(1_000);
        a.pause(1_500); // already paused, ignored
        a.resume(2_000);
        a.resume(2_500); // not paused, ignored
        a.pause(4_000);
        a.resume(7_000);
        assert_eq!(a.accumulated_pause, 4_000);
        assert_eq!(a.effective_elapsed(10_000), 6_000);
    }

    #[test]
    fn open_pause_counts_toward_paused_total() {
        let mut a = attempt_at(0);
        a.pause(3_000);
        assert_eq!(a.paused_total(5_000), 2_000);
        assert_eq!(a.effective_elapsed(5_000), 3_000);
        assert_eq!(a.effective_elapsed(9_000), 3_000);
    }

    #[test]
    fn progress_is_clamped() {
        let a = attempt_at(1_000);
        assert_eq!(a.progress(500, 10_000), 0.0);
        assert_eq!(a.progress(6_000, 10_000), 50.0);
        assert_eq!(a.progress(60_000, 10_000), 100.0);
    }
}
