//! Simulation clock — owns tick count and logical time.

use crate::types::{Millis, RunId, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub run_id:        RunId,
    pub current_tick:  Tick,
    pub now:           Millis,
    pub tick_interval: Millis,
}

impl SimClock {
    pub fn new(run_id: RunId, tick_interval: Millis) -> Self {
        Self {
            run_id,
            current_tick: 0,
            now: 0,
            tick_interval,
        }
    }

    /// Advance one fixed interval. Returns the new tick number.
    pub fn advance(&mut self) -> Tick {
        self.current_tick += 1;
        self.now += self.tick_interval;
        self.current_tick
    }

    /// Advance one tick to a host-supplied time.
    /// Time never runs backwards; an earlier `now` is held at the current time.
    pub fn advance_to(&mut self, now: Millis) -> Tick {
        if now < self.now {
            log::warn!("clock asked to go back from {} to {now}; holding", self.now);
        }
        self.current_tick += 1;
        self.now = self.now.max(now);
        self.current_tick
    }
}
