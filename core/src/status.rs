//! Presentation snapshot — what a per-zone progress bar shows.

use crate::{
    checkpoint::{AttemptKind, Checkpoint, ZonePhase},
    types::{Millis, TeamId, ZoneName},
    zone::ResourceKind,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneStatus {
    pub zone:      ZoneName,
    pub kind:      ResourceKind,
    pub phase:     String,
    pub label:     String,
    pub acting:    Option<TeamId>,
    pub owner:     Option<TeamId>,
    /// Percentage in [0, 100]. Frozen while contested.
    pub progress:  f64,
    pub contested: bool,
}

impl ZoneStatus {
    pub fn of(checkpoint: &Checkpoint, now: Millis) -> Self {
        let zone = checkpoint.name();
        let kind = checkpoint.kind();
        let phase = checkpoint.phase();
        let progress = checkpoint.progress(now);

        let label = match phase {
            ZonePhase::Unclaimed => format!("{zone} ({kind}) (Unclaimed)"),
            ZonePhase::Controlled { owner } => format!("{owner} controls {zone} ({kind})"),
            ZonePhase::Claiming(a) => format!("{} claiming {zone} ({kind}) ({progress:.0}%)", a.team),
            ZonePhase::Clearing(a) => match &a.holder {
                Some(holder) => format!("{holder}'s control being cleared ({progress:.0}%)"),
                None         => format!("{} clearing {zone} ({kind}) ({progress:.0}%)", a.team),
            },
            ZonePhase::Contested { interrupted, .. } => {
                let what = match interrupted {
                    AttemptKind::Claim => "claim",
                    AttemptKind::Clear => "clear",
                };
                format!("{zone} ({kind}) (Contested, {what} frozen at {progress:.0}%)")
            }
        };

        Self {
            zone: zone.to_string(),
            kind,
            phase: phase.name().to_string(),
            label,
            acting: phase.acting_team().cloned(),
            owner: phase.owner().cloned(),
            progress,
            contested: matches!(phase, ZonePhase::Contested { .. }),
        }
    }

    /// Fill fraction in [0, 1] for a bar widget.
    pub fn fraction(&self) -> f32 {
        (self.progress / 100.0) as f32
    }
}
