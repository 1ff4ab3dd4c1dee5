//! The simulation engine — drives every zone, the scheduler and the
//! bonus dispatcher once per tick.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   1. Checkpoints, in registration order. Each zone's occupancy is
//!      classified and its state machine advanced.
//!   2. Capture bonuses for this tick's captures, then a territory
//!      recount if any zone changed hands.
//!   3. Distribution scheduler.
//!   4. Session time limit.
//!
//! RULES:
//!   - A failure inside one zone is logged at the zone boundary and
//!     never stops sibling zones or the scheduler.
//!   - Every emitted event is offered to the notification sinks, then
//!     persisted to the event log. A store failure is returned after the
//!     sinks have seen the events; simulation state is not rolled back.
//!   - Ticks are never re-entered: `tick` takes `&mut self`.

use crate::{
    bonus::CaptureBonusDispatcher,
    checkpoint::{Checkpoint, ZoneStep},
    clock::SimClock,
    config::StormConfig,
    contest::classify,
    distribution::DistributionScheduler,
    error::{SimError, SimResult},
    event::{EndReason, EventLogEntry, SimEvent},
    ledger::{AccountLedger, ResourceAccount, Settlement},
    notify::{broadcast, NotificationSink},
    occupancy::OccupancyDetector,
    roster::TeamRoster,
    status::ZoneStatus,
    store::SimStore,
    tally::TerritoryTally,
    types::{ActorId, Millis, RunId, TeamId, Tick},
    zone::{ResourceKind, Zone},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active { started_at: Millis },
    Ended { at: Millis },
}

pub struct SimEngine {
    pub run_id:  RunId,
    pub clock:   SimClock,
    config:      StormConfig,
    checkpoints: Vec<Checkpoint>,
    roster:      TeamRoster,
    ledger:      AccountLedger,
    tally:       TerritoryTally,
    scheduler:   DistributionScheduler,
    bonus:       CaptureBonusDispatcher,
    sinks:       Vec<Box<dyn NotificationSink>>,
    store:       SimStore,
    session:     SessionState,
    settlements: Vec<Settlement>,
}

impl SimEngine {
    /// The config is validated here; an engine never exists with a bad one.
    pub fn new(run_id: RunId, config: StormConfig, store: SimStore) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            clock:       SimClock::new(run_id.clone(), config.tick_interval_ms),
            scheduler:   DistributionScheduler::from_config(&config, 0),
            config,
            checkpoints: Vec::new(),
            roster:      TeamRoster::new(),
            ledger:      AccountLedger::new(),
            tally:       TerritoryTally::default(),
            bonus:       CaptureBonusDispatcher,
            sinks:       Vec::new(),
            store,
            session:     SessionState::Idle,
            settlements: Vec::new(),
            run_id,
        })
    }

    /// Engine over a fresh in-memory event log. Used by tests and demos.
    pub fn in_memory(run_id: impl Into<RunId>, config: StormConfig) -> SimResult<Self> {
        let run_id = run_id.into();
        let store = SimStore::in_memory()?;
        store.migrate()?;
        store.insert_run(&run_id, 0, env!("CARGO_PKG_VERSION"), "in-memory")?;
        Self::new(run_id, config, store)
    }

    // ── Setup ──────────────────────────────────────────────────

    /// Register a zone. Names are unique.
    pub fn add_zone(&mut self, zone: Zone) -> SimResult<()> {
        if self.checkpoints.iter().any(|c| c.name() == zone.name) {
            return Err(SimError::invalid_config(format!("duplicate zone name '{}'", zone.name)));
        }
        log::debug!("zone {} ({}) registered", zone.name, zone.kind);
        self.checkpoints.push(Checkpoint::new(zone, self.config.timing()));
        Ok(())
    }

    pub fn add_team(&mut self, name: impl Into<TeamId>) {
        self.roster.add_team(name);
    }

    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    // ── Session lifecycle ──────────────────────────────────────

    /// Put `actor` on `team` and open their account.
    pub fn join(&mut self, actor: ActorId, team: &str) -> SimResult<()> {
        self.roster.join(actor, team)?;
        self.ledger.open(actor);
        if self.is_active() {
            self.tally.sync_accounts(&self.roster, &mut self.ledger);
        }
        log::info!("t={} actor {actor} joined {team}", self.clock.now);
        let event = SimEvent::ActorJoined { at: self.clock.now, actor, team: team.to_string() };
        self.emit(vec![event])
    }

    /// Remove `actor` from play. Returns their final balances.
    pub fn leave(&mut self, actor: &ActorId) -> SimResult<Option<Settlement>> {
        let settlement = self.ledger.close(actor);
        let Some(team) = self.roster.leave(actor) else {
            return Ok(settlement);
        };
        log::info!("t={} actor {actor} left {team}", self.clock.now);
        let event = SimEvent::ActorLeft { at: self.clock.now, actor: *actor, team };
        self.emit(vec![event])?;
        Ok(settlement)
    }

    /// Begin a session at `now`: every zone unclaimed, every timer armed,
    /// every rostered actor holding an account and their starting grant.
    pub fn start(&mut self, now: Millis) -> SimResult<()> {
        if self.is_active() {
            log::warn!("t={now} start ignored: session already running");
            return Ok(());
        }
        self.clock.now = self.clock.now.max(now);
        let now = self.clock.now;

        for checkpoint in &mut self.checkpoints {
            checkpoint.reset();
        }
        self.scheduler.arm(now);
        self.tally = TerritoryTally::default();
        self.settlements.clear();

        let actors: Vec<ActorId> = self.roster.actors().copied().collect();
        for actor in &actors {
            self.ledger.open(*actor);
            for kind in ResourceKind::ALL {
                let grant = self.config.resource(kind).starting_grant;
                if grant > 0 {
                    self.ledger.credit(actor, kind, grant)?;
                }
            }
        }
        self.tally.sync_accounts(&self.roster, &mut self.ledger);
        self.session = SessionState::Active { started_at: now };

        log::info!(
            "t={now} session started: {} zone(s), {} actor(s)",
            self.checkpoints.len(), actors.len()
        );
        self.emit(vec![SimEvent::SessionStarted {
            at:     now,
            zones:  self.checkpoints.len(),
            actors: actors.len(),
        }])
    }

    /// End the running session. Zones go back to unclaimed and every
    /// account is settled and discarded.
    pub fn end(&mut self, reason: EndReason) -> SimResult<Vec<Settlement>> {
        if !self.is_active() {
            return Err(SimError::SessionNotActive);
        }
        let event = self.finish(reason);
        self.emit(vec![event])?;
        Ok(self.settlements.clone())
    }

    fn finish(&mut self, reason: EndReason) -> SimEvent {
        let now = self.clock.now;
        for checkpoint in &mut self.checkpoints {
            checkpoint.reset();
        }
        self.tally = TerritoryTally::default();
        self.ledger.clear_owned_zones();
        self.settlements = self.ledger.close_all();
        self.session = SessionState::Ended { at: now };
        log::info!(
            "t={now} session ended ({reason:?}), {} account(s) settled",
            self.settlements.len()
        );
        SimEvent::SessionEnded { at: now, reason }
    }

    // ── Ticking ────────────────────────────────────────────────

    /// Advance one fixed interval.
    pub fn tick(&mut self, detector: &dyn OccupancyDetector) -> SimResult<Vec<SimEvent>> {
        self.clock.advance();
        self.run_tick(detector)
    }

    /// Advance one tick to host-supplied time `now`.
    pub fn tick_at(&mut self, now: Millis, detector: &dyn OccupancyDetector) -> SimResult<Vec<SimEvent>> {
        self.clock.advance_to(now);
        self.run_tick(detector)
    }

    /// Run up to `n` fixed ticks; stops early if the session ends.
    pub fn run_ticks(&mut self, n: u64, detector: &dyn OccupancyDetector) -> SimResult<()> {
        for _ in 0..n {
            if !self.is_active() {
                break;
            }
            self.tick(detector)?;
        }
        Ok(())
    }

    fn run_tick(&mut self, detector: &dyn OccupancyDetector) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.current_tick;
        let now = self.clock.now;
        let mut events = vec![SimEvent::TickStarted { tick, at: now }];

        if let SessionState::Active { started_at } = self.session {
            let mut ownership_changed = false;
            let mut captures = Vec::new();

            for checkpoint in &mut self.checkpoints {
                let step = match update_zone(checkpoint, now, detector, &self.roster) {
                    Ok(step) => step,
                    Err(e) => {
                        log::error!("t={now} zone {}: update failed, skipped: {e}", checkpoint.name());
                        continue;
                    }
                };
                events.extend(step.notices);
                ownership_changed |= step.ownership_changed;
                captures.extend(step.capture);
            }

            for capture in &captures {
                events.extend(self.bonus.dispatch(
                    capture,
                    &self.config.resources,
                    &self.checkpoints,
                    &self.roster,
                    &mut self.ledger,
                    &mut self.tally,
                ));
            }

            // A clear that starts drops ownership without any capture.
            if ownership_changed && captures.is_empty() {
                self.tally = TerritoryTally::from_checkpoints(&self.checkpoints);
                self.tally.sync_accounts(&self.roster, &mut self.ledger);
            }

            events.extend(self.scheduler.run(now, &self.tally, &self.roster, &mut self.ledger));

            let limit = self.config.game_duration_ms;
            if limit > 0 && now.saturating_sub(started_at) >= limit {
                events.push(self.finish(EndReason::TimeLimit));
            }
        }

        events.push(SimEvent::TickCompleted { tick, at: now });
        self.emit(events.clone())?;
        Ok(events)
    }

    /// Notify, then persist.
    fn emit(&mut self, events: Vec<SimEvent>) -> SimResult<()> {
        broadcast(&mut self.sinks, &events);
        for event in &events {
            let entry = EventLogEntry {
                id:         None,
                run_id:     self.run_id.clone(),
                tick:       self.clock.current_tick,
                at:         self.clock.now,
                source:     event.source().to_string(),
                event_type: event.type_name().to_string(),
                payload:    serde_json::to_string(event)?,
            };
            self.store.append_event(&entry)?;
        }
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn config(&self) -> &StormConfig {
        &self.config
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn is_active(&self) -> bool {
        matches!(self.session, SessionState::Active { .. })
    }

    pub fn now(&self) -> Millis {
        self.clock.now
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn checkpoint(&self, zone: &str) -> SimResult<&Checkpoint> {
        self.checkpoints
            .iter()
            .find(|c| c.name() == zone)
            .ok_or_else(|| SimError::UnknownZone { name: zone.to_string() })
    }

    pub fn zones(&self) -> Vec<Zone> {
        self.checkpoints.iter().map(|c| c.zone().clone()).collect()
    }

    /// What each zone's progress bar shows right now.
    pub fn statuses(&self) -> Vec<ZoneStatus> {
        self.checkpoints
            .iter()
            .map(|c| ZoneStatus::of(c, self.clock.now))
            .collect()
    }

    pub fn roster(&self) -> &TeamRoster {
        &self.roster
    }

    pub fn tally(&self) -> &TerritoryTally {
        &self.tally
    }

    pub fn account(&self, actor: &ActorId) -> Option<&ResourceAccount> {
        self.ledger.account(actor)
    }

    /// Balances settled when the last session ended.
    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    /// Query events for a specific tick from the store.
    /// Used by the determinism test and replay tooling.
    pub fn store_events_for_tick(&self, run_id: &str, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(run_id, tick)
    }

    pub fn store(&self) -> &SimStore {
        &self.store
    }
}

/// One zone's tick: ask the detector, drop occupants the roster no
/// longer backs, classify, advance.
fn update_zone(
    checkpoint: &mut Checkpoint,
    now:        Millis,
    detector:   &dyn OccupancyDetector,
    roster:     &TeamRoster,
) -> SimResult<ZoneStep> {
    let occupants = detector.occupants(checkpoint.zone(), roster)?;
    let current: Vec<_> = occupants
        .into_iter()
        .filter(|o| match roster.team_of(&o.actor) {
            Some(team) if *team == o.team => true,
            _ => {
                let e = SimError::StaleActorReference { actor: o.actor };
                log::warn!("t={now} zone {}: skipping occupant: {e}", checkpoint.name());
                false
            }
        })
        .collect();
    Ok(checkpoint.advance(now, &classify(&current)))
}
