//! Simulation driver.
//!
//! Owns the committed snapshot and swaps in each tick's outcome whole.
//! Rejected ticks leave the snapshot untouched. The driver also keeps the
//! bounded event log, tracks which conflicts are open across ticks, raises
//! incident records, buffers fee transactions for the ledger, and answers
//! resolution requests on demand.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ScenarioConfig};
use crate::conflict::{Conflict, ConflictSeverity, TrackPosition};
use crate::engine::{SimulationState, TickEngine, TickInput};
use crate::events::{EventKind, EventLog, EventSeverity, FeeTransaction, IncidentRecord, SimEvent};
use crate::kinematics::{geodetic_position, monitored_tracks};
use crate::resolution::{ManeuverResolver, Resolution};
use crate::weather::ThrottleDecision;

/// Result of one `advance` call.
#[derive(Debug, Clone, PartialEq)]
pub enum TickReport {
    Applied {
        tick: u64,
        events: usize,
        conflicts: usize,
        new_incidents: usize,
        throttle: ThrottleDecision,
    },
    Skipped {
        reason: String,
    },
}

impl TickReport {
    pub fn is_applied(&self) -> bool {
        matches!(self, TickReport::Applied { .. })
    }
}

/// Renderer-facing position of one aircraft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    pub aircraft_id: String,
    pub operator: String,
    pub phase: String,
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
}

#[derive(Debug, Clone)]
struct ActiveConflict {
    conflict: Conflict,
    incident_raised: bool,
}

pub struct Simulation<R: Rng = ChaCha8Rng> {
    engine: TickEngine<R>,
    resolver: ManeuverResolver,
    state: SimulationState,
    events: EventLog,
    fees: EventLog<FeeTransaction>,
    incidents: EventLog<IncidentRecord>,
    active_conflicts: BTreeMap<String, ActiveConflict>,
    skipped_ticks: u64,
}

impl Simulation<ChaCha8Rng> {
    /// Seeded run: the scenario's seed fully determines the outcome.
    pub fn new(config: ScenarioConfig) -> Result<Self, ConfigError> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(Arc::new(config), rng)
    }
}

impl<R: Rng> Simulation<R> {
    pub fn with_rng(config: Arc<ScenarioConfig>, rng: R) -> Result<Self, ConfigError> {
        let mut engine = TickEngine::new(config.clone(), rng)?;
        let state = engine.initial_state();
        Ok(Self {
            resolver: ManeuverResolver::new(config.maneuvers.clone(), config.separation.clone()),
            events: EventLog::new(config.event_log_capacity),
            engine,
            state,
            fees: EventLog::new(config.event_log_capacity),
            incidents: EventLog::new(config.event_log_capacity),
            active_conflicts: BTreeMap::new(),
            skipped_ticks: 0,
        })
    }

    /// Replace the initial snapshot, e.g. to resume a saved run.
    pub fn with_state(mut self, state: SimulationState) -> Self {
        self.state = state;
        self.active_conflicts.clear();
        self
    }

    pub fn config(&self) -> &ScenarioConfig {
        self.engine.config()
    }

    /// The committed snapshot.
    pub fn snapshot(&self) -> &SimulationState {
        &self.state
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }

    /// Events evicted from the log before anyone drained them.
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    pub fn dropped_fees(&self) -> u64 {
        self.fees.dropped()
    }

    pub fn dropped_incidents(&self) -> u64 {
        self.incidents.dropped()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Run one tick. Invalid input skips the tick and leaves the snapshot as
    /// it was.
    pub fn advance(&mut self, input: &TickInput) -> TickReport {
        let outcome = match self.engine.step(&self.state, input) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.skipped_ticks += 1;
                let reason = err.to_string();
                tracing::warn!("Skipping tick after {}: {}", self.state.tick, reason);
                self.events.push(SimEvent {
                    tick: self.state.tick,
                    sim_time: self.state.sim_time,
                    severity: EventSeverity::Warning,
                    kind: EventKind::TickSkipped {
                        reason: reason.clone(),
                    },
                    message: format!("Tick skipped: {reason}"),
                });
                return TickReport::Skipped { reason };
            }
        };

        let tick = outcome.state.tick;
        let sim_time = outcome.state.sim_time;
        let event_count = outcome.events.len();
        self.events.extend(outcome.events);
        self.fees.extend(outcome.fees);

        let mut new_incidents = 0;
        let mut still_open = BTreeMap::new();
        for conflict in &outcome.conflicts {
            let id = conflict.conflict_id();
            let mut entry = match self.active_conflicts.remove(&id) {
                Some(previous) => ActiveConflict {
                    conflict: conflict.clone(),
                    incident_raised: previous.incident_raised,
                },
                None => {
                    tracing::info!(
                        "Conflict opened between {} and {} ({:?})",
                        conflict.aircraft_a,
                        conflict.aircraft_b,
                        conflict.severity
                    );
                    self.events.push(SimEvent {
                        tick,
                        sim_time,
                        severity: event_severity(conflict.severity),
                        kind: EventKind::ConflictOpened {
                            aircraft_a: conflict.aircraft_a.clone(),
                            aircraft_b: conflict.aircraft_b.clone(),
                            severity: conflict.severity,
                        },
                        message: format!(
                            "{:?} conflict: {} and {} at {:.0} m / {:.0} m",
                            conflict.severity,
                            conflict.aircraft_a,
                            conflict.aircraft_b,
                            conflict.horizontal_m,
                            conflict.vertical_m
                        ),
                    });
                    ActiveConflict {
                        conflict: conflict.clone(),
                        incident_raised: false,
                    }
                }
            };
            // A conflict that escalates into the incident tier is recorded once.
            let incident_tier = conflict.severity >= self.engine.config().incident_min_severity;
            if !entry.incident_raised && incident_tier {
                self.incidents
                    .push(IncidentRecord::from_conflict(conflict, tick, sim_time));
                new_incidents += 1;
                entry.incident_raised = true;
            }
            still_open.insert(id, entry);
        }

        for (_, cleared) in std::mem::replace(&mut self.active_conflicts, still_open) {
            tracing::debug!(
                "Conflict cleared between {} and {}",
                cleared.conflict.aircraft_a,
                cleared.conflict.aircraft_b
            );
            self.events.push(SimEvent {
                tick,
                sim_time,
                severity: EventSeverity::Success,
                kind: EventKind::ConflictCleared {
                    aircraft_a: cleared.conflict.aircraft_a.clone(),
                    aircraft_b: cleared.conflict.aircraft_b.clone(),
                },
                message: format!(
                    "Separation restored between {} and {}",
                    cleared.conflict.aircraft_a, cleared.conflict.aircraft_b
                ),
            });
        }

        self.state = outcome.state;
        TickReport::Applied {
            tick,
            events: event_count,
            conflicts: outcome.conflicts.len(),
            new_incidents,
            throttle: outcome.throttle,
        }
    }

    /// Remove everything in the event log, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Fees and incidents share the event log capacity; undrained entries
    /// beyond it are evicted oldest first.
    pub fn drain_fees(&mut self) -> Vec<FeeTransaction> {
        self.fees.drain()
    }

    pub fn drain_incidents(&mut self) -> Vec<IncidentRecord> {
        self.incidents.drain()
    }

    /// Conflicts open on the committed snapshot, in pair order.
    pub fn active_conflicts(&self) -> Vec<&Conflict> {
        self.active_conflicts.values().map(|entry| &entry.conflict).collect()
    }

    /// Tracks of every monitored aircraft on the committed snapshot.
    pub fn tracks(&self) -> Vec<TrackPosition> {
        monitored_tracks(
            &self.state.aircraft,
            &self.state.gates,
            &self.state.corridors,
            self.engine.config(),
        )
    }

    /// Ask the resolver for corrective actions against the committed
    /// snapshot. Aircraft that are no longer monitored get a rejection.
    pub fn propose_resolution(&self, conflict: &Conflict) -> Resolution {
        let tracks = self.tracks();
        let find = |id: &str| tracks.iter().find(|track| track.aircraft_id == id);
        match (find(&conflict.aircraft_a), find(&conflict.aircraft_b)) {
            (Some(a), Some(b)) => {
                let resolution = self.resolver.resolve(conflict, a, b);
                tracing::debug!(
                    "Resolution for {}: {:?} ({})",
                    resolution.conflict_id,
                    resolution.strategy,
                    resolution.status.label()
                );
                resolution
            }
            _ => Resolution::rejected(
                conflict.conflict_id(),
                "an aircraft in this conflict is no longer tracked",
            ),
        }
    }

    /// Lat/lon of every aircraft with a resolvable position. Empty when the
    /// scenario has no geo reference.
    pub fn geodetic_positions(&self) -> Vec<GeodeticPosition> {
        let config = self.engine.config();
        self.state
            .aircraft
            .iter()
            .filter_map(|aircraft| {
                let (lat, lon, altitude_m) =
                    geodetic_position(aircraft, config, &self.state.corridors)?;
                Some(GeodeticPosition {
                    aircraft_id: aircraft.aircraft_id.clone(),
                    operator: aircraft.operator.clone(),
                    phase: aircraft.phase.label().to_string(),
                    lat,
                    lon,
                    altitude_m,
                })
            })
            .collect()
    }
}

fn event_severity(severity: ConflictSeverity) -> EventSeverity {
    match severity {
        ConflictSeverity::Critical => EventSeverity::Error,
        ConflictSeverity::High => EventSeverity::Warning,
        ConflictSeverity::Medium | ConflictSeverity::Low => EventSeverity::Info,
    }
}
