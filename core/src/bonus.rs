//! Capture bonus dispatcher.
//!
//! Stateless. Runs once per `CaptureEvent`: credits the configured
//! bonus for the zone's kind to every member of the capturing team,
//! then recounts territory for every team.

use crate::{
    checkpoint::{CaptureEvent, Checkpoint},
    config::ResourceTable,
    event::SimEvent,
    ledger::AccountLedger,
    roster::TeamRoster,
    tally::TerritoryTally,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureBonusDispatcher;

impl CaptureBonusDispatcher {
    /// Only the captured zone's kind is paid; a Money zone never pays Upgrade.
    pub fn dispatch(
        &self,
        capture:     &CaptureEvent,
        resources:   &ResourceTable,
        checkpoints: &[Checkpoint],
        roster:      &TeamRoster,
        ledger:      &mut AccountLedger,
        tally:       &mut TerritoryTally,
    ) -> Vec<SimEvent> {
        let mut out = vec![SimEvent::ZoneCaptured {
            at:   capture.at,
            zone: capture.zone.clone(),
            kind: capture.kind,
            team: capture.team.clone(),
        }];

        let amount = resources.get(capture.kind).capture_bonus_amount;
        match roster.team(&capture.team) {
            Some(team) if amount > 0 => {
                let mut recipients = 0usize;
                for actor in team.members() {
                    match ledger.credit(actor, capture.kind, amount) {
                        Ok(_)  => recipients += 1,
                        Err(e) => log::warn!(
                            "t={} capture bonus for {}: skipping member: {e}",
                            capture.at, capture.team
                        ),
                    }
                }
                log::info!(
                    "t={} {} captured {} ({}): +{amount} {} to {recipients} member(s)",
                    capture.at, capture.team, capture.zone, capture.kind, capture.kind
                );
                out.push(SimEvent::CaptureBonusAwarded {
                    at:   capture.at,
                    zone: capture.zone.clone(),
                    team: capture.team.clone(),
                    kind: capture.kind,
                    amount,
                    recipients,
                });
            }
            Some(_) => {}
            None => log::warn!(
                "t={} capture of {} by unregistered team {}; no bonus paid",
                capture.at, capture.zone, capture.team
            ),
        }

        *tally = TerritoryTally::from_checkpoints(checkpoints);
        tally.sync_accounts(roster, ledger);

        out
    }
}
