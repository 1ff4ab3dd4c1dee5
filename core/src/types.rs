//! Shared primitive types used across the entire simulation.

/// Logical simulation time in milliseconds since the session clock started.
pub type Millis = u64;

/// A simulation tick counter. One tick = one `tick_interval_ms` step.
pub type Tick = u64;

/// A stable, unique identifier for an actor (player) in the session.
pub type ActorId = uuid::Uuid;

/// Team names are their identity.
pub type TeamId = String;

/// Zone names are unique keys.
pub type ZoneName = String;

/// The canonical run identifier.
pub type RunId = String;
