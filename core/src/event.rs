//! The event bus — everything the simulation tells the outside world.
//!
//! RULE: Events are fire-and-forget. Sinks and the event log consume
//! them; nothing inside the simulation reads them back to make decisions.

use crate::{
    types::{ActorId, Millis, RunId, TeamId, Tick, ZoneName},
    zone::ResourceKind,
};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants may be appended — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        tick: Tick,
        at:   Millis,
    },
    TickCompleted {
        tick: Tick,
        at:   Millis,
    },

    // ── Session lifecycle ──────────────────────────
    SessionStarted {
        at:     Millis,
        zones:  usize,
        actors: usize,
    },
    SessionEnded {
        at:     Millis,
        reason: EndReason,
    },
    ActorJoined {
        at:    Millis,
        actor: ActorId,
        team:  TeamId,
    },
    ActorLeft {
        at:    Millis,
        actor: ActorId,
        team:  TeamId,
    },

    // ── Checkpoint transitions ─────────────────────
    ZoneClaimStarted {
        at:   Millis,
        zone: ZoneName,
        team: TeamId,
    },
    ZoneClearingStarted {
        at:       Millis,
        zone:     ZoneName,
        team:     TeamId,
        defender: Option<TeamId>,
    },
    /// Clearing finished; the attacker now has to claim from zero.
    ZoneCleared {
        at:             Millis,
        zone:           ZoneName,
        team:           TeamId,
        previous_owner: Option<TeamId>,
    },
    ZoneCaptured {
        at:   Millis,
        zone: ZoneName,
        kind: ResourceKind,
        team: TeamId,
    },
    ZoneAbandoned {
        at:   Millis,
        zone: ZoneName,
        team: TeamId,
    },
    ZoneContested {
        at:    Millis,
        zone:  ZoneName,
        teams: Vec<TeamId>,
    },
    ZoneResumed {
        at:       Millis,
        zone:     ZoneName,
        team:     TeamId,
        progress: f64,
    },

    // ── Rewards ────────────────────────────────────
    CaptureBonusAwarded {
        at:         Millis,
        zone:       ZoneName,
        team:       TeamId,
        kind:       ResourceKind,
        amount:     u64,
        recipients: usize,
    },
    ResourceDistributed {
        at:          Millis,
        team:        TeamId,
        kind:        ResourceKind,
        amount:      u64,
        owned_count: u32,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Manual,
    TimeLimit,
}

impl SimEvent {
    /// Stable name for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TickStarted { .. }         => "tick_started",
            Self::TickCompleted { .. }       => "tick_completed",
            Self::SessionStarted { .. }      => "session_started",
            Self::SessionEnded { .. }        => "session_ended",
            Self::ActorJoined { .. }         => "actor_joined",
            Self::ActorLeft { .. }           => "actor_left",
            Self::ZoneClaimStarted { .. }    => "zone_claim_started",
            Self::ZoneClearingStarted { .. } => "zone_clearing_started",
            Self::ZoneCleared { .. }         => "zone_cleared",
            Self::ZoneCaptured { .. }        => "zone_captured",
            Self::ZoneAbandoned { .. }       => "zone_abandoned",
            Self::ZoneContested { .. }       => "zone_contested",
            Self::ZoneResumed { .. }         => "zone_resumed",
            Self::CaptureBonusAwarded { .. } => "capture_bonus_awarded",
            Self::ResourceDistributed { .. } => "resource_distributed",
        }
    }

    /// Which part of the simulation produced the event.
    pub fn source(&self) -> &'static str {
        match self {
            Self::TickStarted { .. } | Self::TickCompleted { .. } => "engine",
            Self::SessionStarted { .. }
            | Self::SessionEnded { .. }
            | Self::ActorJoined { .. }
            | Self::ActorLeft { .. } => "session",
            Self::ZoneClaimStarted { .. }
            | Self::ZoneClearingStarted { .. }
            | Self::ZoneCleared { .. }
            | Self::ZoneAbandoned { .. }
            | Self::ZoneContested { .. }
            | Self::ZoneResumed { .. } => "checkpoint",
            Self::ZoneCaptured { .. } | Self::CaptureBonusAwarded { .. } => "capture_bonus",
            Self::ResourceDistributed { .. } => "distribution",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub tick:       Tick,
    pub at:         Millis,
    pub source:     String,
    pub event_type: String,
    pub payload:    String, // JSON-serialized SimEvent
}
