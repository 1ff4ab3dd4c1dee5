//! Storm the Front — a territory-control minigame core.
//!
//! Teams capture zones by standing in them uncontested. Controlled zones
//! pay their owners on fixed intervals, doubling per zone held, and every
//! capture pays a one-off bonus.

pub mod bonus;
pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod contest;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod event;
pub mod ledger;
pub mod notify;
pub mod occupancy;
pub mod rng;
pub mod roster;
pub mod status;
pub mod store;
pub mod tally;
pub mod types;
pub mod wander;
pub mod zone;
