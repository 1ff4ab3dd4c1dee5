//! Notification sinks — presentation and chat collaborators.
//!
//! Delivery is best effort. A failing sink is logged and ignored; it
//! never affects simulation state.

use crate::event::SimEvent;

pub trait NotificationSink {
    fn deliver(&mut self, event: &SimEvent) -> anyhow::Result<()>;
}

/// Any `FnMut(&SimEvent)` closure is a sink.
impl<F> NotificationSink for F
where
    F: FnMut(&SimEvent) -> anyhow::Result<()>,
{
    fn deliver(&mut self, event: &SimEvent) -> anyhow::Result<()> {
        self(event)
    }
}

/// Writes player-facing messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&mut self, event: &SimEvent) -> anyhow::Result<()> {
        if let Some(message) = message_for(event) {
            log::info!("{message}");
        }
        Ok(())
    }
}

/// The chat line a player would see for `event`, if any.
pub fn message_for(event: &SimEvent) -> Option<String> {
    let message = match event {
        SimEvent::SessionStarted { zones, .. } => {
            format!("Storm the Front has begun! Capture {zones} checkpoints to earn resources!")
        }
        SimEvent::SessionEnded { .. } => "Storm the Front is over.".to_string(),
        SimEvent::ZoneClaimStarted { zone, team, .. } => format!("{team} is capturing {zone}!"),
        SimEvent::ZoneClearingStarted { zone, team, defender, .. } => match defender {
            Some(defender) => format!("{team} is clearing {defender}'s control of {zone}!"),
            None           => format!("{team} is clearing {zone}!"),
        },
        SimEvent::ZoneCleared { zone, team, .. } => {
            format!("{team} cleared {zone} and is now claiming it!")
        }
        SimEvent::ZoneCaptured { zone, kind, team, .. } => {
            format!("{team} has captured {zone} ({kind})!")
        }
        SimEvent::ZoneAbandoned { zone, team, .. } => {
            format!("{team} abandoned {zone}; it is unclaimed again.")
        }
        SimEvent::ZoneContested { zone, .. } => format!("{zone} is contested!"),
        SimEvent::CaptureBonusAwarded { team, kind, amount, .. } => {
            format!("{team} captured a checkpoint! Bonus: +{amount} {kind}")
        }
        SimEvent::ResourceDistributed { team, kind, amount, owned_count, .. } => format!(
            "{team}: +{amount} {kind} from {owned_count} checkpoint{}",
            if *owned_count == 1 { "" } else { "s" }
        ),
        _ => return None,
    };
    Some(message)
}

/// Hand every event to every sink, swallowing failures.
pub fn broadcast(sinks: &mut [Box<dyn NotificationSink>], events: &[SimEvent]) {
    for sink in sinks.iter_mut() {
        for event in events {
            if let Err(e) = sink.deliver(event) {
                log::debug!("notification for {} dropped: {e}", event.type_name());
            }
        }
    }
}
